//! Script to host conversion.
//!
//! A table is classified once, by its length operator: a positive `#t` makes
//! it an array read over `1..=#t`, anything else makes it a string-keyed map.
//! This is a heuristic and it is kept as is, because scripts rely on it:
//!
//! - an empty table always comes back as an empty map;
//! - holes below the length come back as [`HostValue::Nil`];
//! - a key above the length, or a length larger than the table (a lying
//!   `__len`), fails with [`MarshalError::IndexOutOfRange`];
//! - an array-like table that also carries string keys fails with
//!   [`MarshalError::NonNumericIndex`];
//! - a map whose keys happen to form a sequence from 1 comes back as an array.

use std::collections::BTreeMap;

use mlua::{Table, Value};

use super::{HostValue, MarshalError};

/// Maximum nesting depth followed when pulling a table, matching Lua's own
/// C call limit (`LUAI_MAXCCALLS`).
///
/// Self-referencing tables run into this limit and fail with
/// [`MarshalError::StackExhausted`].
pub const MAX_PULL_DEPTH: usize = 200;

/// Convert a Lua table into a [`HostValue::Array`] or [`HostValue::Map`].
pub fn pull_table(table: &Table) -> Result<HostValue, MarshalError> {
    pull_table_rec(table, 0)
}

/// Convert `value`, which must be a table, into a host value.
pub fn pull_value(value: &Value) -> Result<HostValue, MarshalError> {
    match value {
        Value::Table(t) => pull_table(t),
        other => Err(MarshalError::NotATable(other.type_name().to_string())),
    }
}

fn pull_table_rec(table: &Table, depth: usize) -> Result<HostValue, MarshalError> {
    if depth >= MAX_PULL_DEPTH {
        return Err(MarshalError::StackExhausted);
    }

    let length = table.len()?;
    if length > 0 {
        return pull_array(table, length, depth);
    }

    let mut entries = BTreeMap::new();
    for pair in table.clone().pairs::<Value, Value>() {
        let (key, value) = pair?;
        let key = key_to_string(&key)?;
        entries.insert(key, to_host(&value, depth)?);
    }
    Ok(HostValue::Map(entries))
}

fn pull_array(table: &Table, length: i64, depth: usize) -> Result<HostValue, MarshalError> {
    let mut slots = BTreeMap::new();
    for pair in table.clone().pairs::<Value, Value>() {
        let (key, value) = pair?;
        let index = match key {
            Value::Integer(i) => i,
            Value::Number(n) if n.fract() == 0.0 => n as i64,
            other => return Err(MarshalError::NonNumericIndex(other.type_name().to_string())),
        };
        if index < 1 || index > length {
            return Err(MarshalError::IndexOutOfRange(index, length));
        }
        slots.insert(index, to_host(&value, depth)?);
    }

    // `#t` can come from `__len`; the result never outgrows the table itself.
    let held = i64::try_from(table.raw_len().max(slots.len())).unwrap_or(i64::MAX);
    if length > held {
        return Err(MarshalError::IndexOutOfRange(length, held));
    }

    let items = (1..=length).map(|i| slots.remove(&i).unwrap_or(HostValue::Nil)).collect();
    Ok(HostValue::Array(items))
}

/// Map keys follow Lua's string coercion: strings as is, numbers rendered.
fn key_to_string(key: &Value) -> Result<String, MarshalError> {
    match key {
        Value::String(s) => Ok(s.to_str()?.to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(MarshalError::NonStringKey(other.type_name().to_string())),
    }
}

fn to_host(value: &Value, depth: usize) -> Result<HostValue, MarshalError> {
    match value {
        Value::Boolean(b) => Ok(HostValue::Bool(*b)),
        Value::Integer(i) => Ok(HostValue::Int(*i)),
        Value::Number(n) => Ok(HostValue::Float(*n)),
        Value::String(s) => Ok(HostValue::String(s.to_str()?.to_string())),
        Value::Table(t) => pull_table_rec(t, depth + 1),
        other => Err(MarshalError::UnsupportedType(other.type_name().to_string())),
    }
}

/// Convert a run of call arguments into host values.
///
/// More lenient than [`pull_table`]: nil is kept as [`HostValue::Nil`] and
/// values with no host form (functions, userdata, threads) become
/// [`HostValue::Opaque`] instead of failing. Tables are still pulled
/// strictly. Meant for diagnostics and logging.
pub fn pull_varargs<'a, I>(args: I) -> Result<Vec<HostValue>, MarshalError>
where
    I: IntoIterator<Item = &'a Value>,
{
    args.into_iter()
        .map(|value| match value {
            Value::Nil => Ok(HostValue::Nil),
            Value::Table(t) => pull_table(t),
            Value::Boolean(_) | Value::Integer(_) | Value::Number(_) | Value::String(_) => {
                to_host(value, 0)
            }
            other => Ok(HostValue::Opaque(other.type_name().to_string())),
        })
        .collect()
}
