//! Value exchange between the host and scripts.
//!
//! [`push`] turns a [`HostValue`] into a Lua value, [`pull_table`] and
//! [`pull_varargs`] go the other way. Errors raised here abort the host
//! function that triggered them and surface in the script as runtime errors.

pub mod pull;
pub mod push;
pub mod value;

use thiserror::Error;

pub use pull::{MAX_PULL_DEPTH, pull_table, pull_value, pull_varargs};
pub use push::push;
pub use value::HostValue;

/// Errors raised while moving values across the boundary.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("unsupported type {0}")]
    UnsupportedType(String),

    #[error("key should be a string ({0})")]
    NonStringKey(String),

    #[error("pull array: expected numeric index, got '{0}'")]
    NonNumericIndex(String),

    #[error("pull array: index {0} outside 1..{1}")]
    IndexOutOfRange(i64, i64),

    #[error("pull table, stack exhausted")]
    StackExhausted,

    #[error("need a table, got {0}")]
    NotATable(String),

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

impl From<MarshalError> for mlua::Error {
    fn from(err: MarshalError) -> Self {
        match err {
            MarshalError::Lua(e) => e,
            other => mlua::Error::runtime(other.to_string()),
        }
    }
}
