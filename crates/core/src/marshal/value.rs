//! Host-side value model exchanged with scripts.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A closed set of values that can cross the host/script boundary.
///
/// Embedders convert their native data into a `HostValue` before handing
/// it to a script, so unsupported shapes are rejected at compile time rather
/// than when the value is pushed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HostValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered sequence, becomes a one-indexed table.
    Array(Vec<HostValue>),
    /// String-keyed map.
    Map(BTreeMap<String, HostValue>),
    /// Placeholder for a script value that has no host representation
    /// (function, userdata, thread). Carries the Lua type name. Only
    /// produced by [`pull_varargs`](super::pull_varargs); pushing it back
    /// fails.
    Opaque(String),
}

impl HostValue {
    /// A complex number, represented as `[real, imaginary]`.
    pub fn complex(re: f64, im: f64) -> Self {
        HostValue::Array(vec![HostValue::Float(re), HostValue::Float(im)])
    }

    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Bool(_) => "boolean",
            HostValue::Int(_) | HostValue::Float(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Map(_) => "map",
            HostValue::Opaque(_) => "opaque",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, HostValue>> {
        match self {
            HostValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl std::fmt::Display for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::Nil => f.write_str("nil"),
            HostValue::Bool(b) => write!(f, "{b}"),
            HostValue::Int(i) => write!(f, "{i}"),
            HostValue::Float(n) => write!(f, "{n}"),
            HostValue::String(s) => f.write_str(s),
            HostValue::Opaque(kind) => write!(f, "<{kind}>"),
            HostValue::Array(_) | HostValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl Serialize for HostValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HostValue::Nil => serializer.serialize_unit(),
            HostValue::Bool(b) => serializer.serialize_bool(*b),
            HostValue::Int(i) => serializer.serialize_i64(*i),
            HostValue::Float(n) => serializer.serialize_f64(*n),
            HostValue::String(s) => serializer.serialize_str(s),
            HostValue::Opaque(kind) => serializer.serialize_str(&format!("<{kind}>")),
            HostValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            HostValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for HostValue {
            fn from(i: $t) -> Self {
                HostValue::Int(i64::from(i))
            }
        })*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for HostValue {
    fn from(i: u64) -> Self {
        i64::try_from(i).map(HostValue::Int).unwrap_or(HostValue::Float(i as f64))
    }
}

impl From<usize> for HostValue {
    fn from(i: usize) -> Self {
        HostValue::from(i as u64)
    }
}

impl From<f32> for HostValue {
    fn from(n: f32) -> Self {
        HostValue::Float(f64::from(n))
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Float(n)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<HostValue>> From<BTreeMap<String, T>> for HostValue {
    fn from(entries: BTreeMap<String, T>) -> Self {
        HostValue::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<HostValue>> From<std::collections::HashMap<String, T>> for HostValue {
    fn from(entries: std::collections::HashMap<String, T>) -> Self {
        HostValue::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HostValue::Nil)
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => HostValue::Nil,
            serde_json::Value::Bool(b) => HostValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => HostValue::Int(i),
                None => HostValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => HostValue::String(s),
            serde_json::Value::Array(items) => {
                HostValue::Array(items.into_iter().map(HostValue::from).collect())
            }
            serde_json::Value::Object(entries) => HostValue::Map(
                entries.into_iter().map(|(k, v)| (k, HostValue::from(v))).collect(),
            ),
        }
    }
}

/// Render a YAML key that is not a plain string (`1: x`, `true: y`).
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<serde_yaml::Value> for HostValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => HostValue::Nil,
            serde_yaml::Value::Bool(b) => HostValue::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    HostValue::Int(i)
                } else {
                    HostValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => HostValue::String(s),
            serde_yaml::Value::Sequence(items) => {
                HostValue::Array(items.into_iter().map(HostValue::from).collect())
            }
            serde_yaml::Value::Mapping(entries) => HostValue::Map(
                entries.into_iter().map(|(k, v)| (yaml_key(k), HostValue::from(v))).collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => HostValue::from(tagged.value),
        }
    }
}
