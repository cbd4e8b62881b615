//! Host to script conversion.

use mlua::{Lua, Value};

use super::{HostValue, MarshalError};

/// Convert `value` into a Lua value owned by `lua`.
///
/// Arrays become one-indexed sequence tables, maps become tables keyed by
/// their string keys. [`HostValue::Opaque`] has no Lua counterpart and is
/// rejected with [`MarshalError::UnsupportedType`].
pub fn push(lua: &Lua, value: &HostValue) -> Result<Value, MarshalError> {
    let pushed = match value {
        HostValue::Nil => Value::Nil,
        HostValue::Bool(b) => Value::Boolean(*b),
        HostValue::Int(i) => Value::Integer(*i),
        HostValue::Float(n) => Value::Number(*n),
        HostValue::String(s) => Value::String(lua.create_string(s)?),
        HostValue::Array(items) => {
            let table = lua.create_table_with_capacity(items.len(), 0)?;
            for (i, item) in items.iter().enumerate() {
                table.raw_set(i + 1, push(lua, item)?)?;
            }
            Value::Table(table)
        }
        HostValue::Map(entries) => {
            let table = lua.create_table_with_capacity(0, entries.len())?;
            for (key, item) in entries {
                table.raw_set(key.as_str(), push(lua, item)?)?;
            }
            Value::Table(table)
        }
        HostValue::Opaque(kind) => {
            return Err(MarshalError::UnsupportedType(kind.clone()));
        }
    };
    Ok(pushed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::Table;
    use std::collections::BTreeMap;

    #[test]
    fn test_push_primitives() {
        let lua = Lua::new();
        assert_eq!(push(&lua, &HostValue::Bool(true)).unwrap(), Value::Boolean(true));
        assert_eq!(push(&lua, &HostValue::Int(4)).unwrap(), Value::Integer(4));
        assert_eq!(push(&lua, &HostValue::Float(0.5)).unwrap(), Value::Number(0.5));
        let s = push(&lua, &HostValue::from("hey")).unwrap();
        assert_eq!(s.as_string().unwrap().to_str().unwrap(), "hey");
    }

    #[test]
    fn test_push_array_is_one_indexed() {
        let lua = Lua::new();
        let v = push(&lua, &HostValue::from(vec!["a", "b", "c"])).unwrap();
        lua.globals().set("t", v).unwrap();
        let (len, first, last): (i64, String, String) =
            lua.load("return #t, t[1], t[3]").eval().unwrap();
        assert_eq!((len, first.as_str(), last.as_str()), (3, "a", "c"));
    }

    #[test]
    fn test_push_nested_map() {
        let lua = Lua::new();
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), HostValue::Int(1));
        m.insert("b".to_string(), HostValue::from(vec![2i64, 3]));
        let v = push(&lua, &HostValue::Map(m)).unwrap();
        let t: Table = match v {
            Value::Table(t) => t,
            other => panic!("expected table, got {other:?}"),
        };
        assert_eq!(t.get::<i64>("a").unwrap(), 1);
        assert_eq!(t.get::<Table>("b").unwrap().get::<i64>(2).unwrap(), 3);
    }

    #[test]
    fn test_push_complex() {
        let lua = Lua::new();
        let v = push(&lua, &HostValue::complex(1.5, 2.0)).unwrap();
        lua.globals().set("c", v).unwrap();
        let (re, im): (f64, f64) = lua.load("return c[1], c[2]").eval().unwrap();
        assert_eq!((re, im), (1.5, 2.0));
    }

    #[test]
    fn test_push_opaque_fails() {
        let lua = Lua::new();
        let nested = HostValue::from(vec![HostValue::Opaque("function".into())]);
        let err = push(&lua, &nested).unwrap_err();
        assert!(matches!(err, MarshalError::UnsupportedType(ref t) if t == "function"));
    }
}
