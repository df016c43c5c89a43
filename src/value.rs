use std::fmt::Write;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Format used when binding timestamps as SQLite text.
pub(crate) const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// A database value, used both for bind parameters and buffered row columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value, stored by the engine as 0/1
    Bool(bool),
    /// Timestamp value, stored as text
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value, stored as serialized text
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert into the engine's owned value type for binding.
    pub(crate) fn to_engine(&self) -> rusqlite::types::Value {
        match self {
            Self::Int(i) => rusqlite::types::Value::Integer(*i),
            Self::Float(f) => rusqlite::types::Value::Real(*f),
            Self::Text(s) => rusqlite::types::Value::Text(s.clone()),
            Self::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
            Self::Timestamp(dt) => {
                let mut buf = String::with_capacity(32);
                // Format cannot fail when writing into a String.
                let _ = write!(buf, "{}", dt.format(TIMESTAMP_FORMAT));
                rusqlite::types::Value::Text(buf)
            }
            Self::Null => rusqlite::types::Value::Null,
            Self::Json(jval) => rusqlite::types::Value::Text(jval.to_string()),
            Self::Blob(bytes) => rusqlite::types::Value::Blob(bytes.clone()),
        }
    }

    /// Convert a borrowed engine column value into an owned [`Value`].
    pub(crate) fn from_engine(value: rusqlite::types::ValueRef<'_>) -> Result<Self, rusqlite::Error> {
        Ok(match value {
            rusqlite::types::ValueRef::Null => Self::Null,
            rusqlite::types::ValueRef::Integer(i) => Self::Int(i),
            rusqlite::types::ValueRef::Real(f) => Self::Float(f),
            rusqlite::types::ValueRef::Text(_) => Self::Text(value.as_str()?.to_owned()),
            rusqlite::types::ValueRef::Blob(b) => Self::Blob(b.to_vec()),
        })
    }
}

/// One element of a bind list: either the next positional placeholder or a
/// named placeholder resolved through the prepared statement.
#[derive(Debug, Clone)]
pub enum BindParam {
    Positional(Value),
    Named(String, Value),
}

macro_rules! impl_value_from {
    ($($from:ty => $variant:ident ( $conv:expr )),+ $(,)?) => {
        $(
            impl From<$from> for Value {
                fn from(v: $from) -> Self {
                    Self::$variant($conv(v))
                }
            }

            impl From<$from> for BindParam {
                fn from(v: $from) -> Self {
                    Self::Positional(Value::from(v))
                }
            }
        )+
    };
}

impl_value_from! {
    i32 => Int(i64::from),
    u32 => Int(i64::from),
    i64 => Int(std::convert::identity),
    f64 => Float(std::convert::identity),
    bool => Bool(std::convert::identity),
    &str => Text(str::to_owned),
    String => Text(std::convert::identity),
    Vec<u8> => Blob(std::convert::identity),
    NaiveDateTime => Timestamp(std::convert::identity),
    JsonValue => Json(std::convert::identity),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<Value> for BindParam {
    fn from(v: Value) -> Self {
        Self::Positional(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for BindParam {
    fn from(v: Option<T>) -> Self {
        Self::Positional(v.map_or(Value::Null, Into::into))
    }
}

/// Named binds accept the parameter name as any string-ish type; `("name", v)`
/// and `(String::from("name"), v)` behave identically.
impl<S: Into<String>, V: Into<Value>> From<(S, V)> for BindParam {
    fn from((name, value): (S, V)) -> Self {
        Self::Named(name.into(), value.into())
    }
}

/// Build a `&[BindParam]` slice from a mixed list of positional values and
/// `(name, value)` pairs.
///
/// ```
/// use sqlite_service::params;
///
/// let positional = params![41, "world"];
/// let named = params![(":id", 7), (":label", "x")];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[$crate::BindParam]
    };
    ($($param:expr),+ $(,)?) => {
        &[$($crate::BindParam::from($param)),+] as &[$crate::BindParam]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_macro_builds_mixed_lists() {
        let list = params![41, "world", (":named", 7)];
        assert_eq!(list.len(), 3);
        assert!(matches!(&list[0], BindParam::Positional(Value::Int(41))));
        assert!(matches!(&list[1], BindParam::Positional(Value::Text(t)) if t == "world"));
        assert!(matches!(&list[2], BindParam::Named(n, Value::Int(7)) if n == ":named"));
    }

    #[test]
    fn named_param_accepts_owned_and_borrowed_names() {
        let owned = String::from(":p");
        let a = BindParam::from((owned, 1));
        let b = BindParam::from((":p", 1));
        match (a, b) {
            (BindParam::Named(n1, _), BindParam::Named(n2, _)) => assert_eq!(n1, n2),
            other => panic!("expected named params, got {other:?}"),
        }
    }

    #[test]
    fn option_maps_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn bool_and_timestamp_bind_as_engine_text_or_int() {
        assert_eq!(
            Value::Bool(true).to_engine(),
            rusqlite::types::Value::Integer(1)
        );
        let dt = NaiveDateTime::parse_from_str("2024-05-01 10:30:00", "%F %T").unwrap();
        match Value::Timestamp(dt).to_engine() {
            rusqlite::types::Value::Text(t) => assert!(t.starts_with("2024-05-01 10:30:00")),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
