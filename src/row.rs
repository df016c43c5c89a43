//! Typed row extraction.
//!
//! A fetched row is converted into a fixed-arity tuple whose element types
//! implement [`FromColumn`]. Conversions are checked: a column value that the
//! destination type cannot represent is a `ConversionFailure`, never a silent
//! truncation. Engine NULL maps to the element type's `Default` value, or to
//! `None` for `Option` elements.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqliteServiceError;
use crate::value::{TIMESTAMP_FORMAT, Value};

/// Convert one buffered column value into a statically typed element.
pub trait FromColumn: Sized + Default {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError>;
}

/// Convert a buffered row into a fixed-arity tuple.
///
/// Implemented for tuples of [`FromColumn`] elements up to arity 8. The
/// column count must match the tuple arity exactly.
pub trait FromRow: Sized {
    /// Number of columns this row type expects.
    const WIDTH: usize;

    fn from_row(columns: &[Value]) -> Result<Self, SqliteServiceError>;
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Int(_) => "INTEGER",
        Value::Float(_) => "REAL",
        Value::Text(_) => "TEXT",
        Value::Bool(_) => "BOOLEAN",
        Value::Timestamp(_) => "TIMESTAMP",
        Value::Null => "NULL",
        Value::Json(_) => "JSON",
        Value::Blob(_) => "BLOB",
    }
}

fn mismatch(expected: &str, got: &Value) -> SqliteServiceError {
    SqliteServiceError::ConversionFailure(format!(
        "cannot convert {} column to {expected}",
        type_name(got)
    ))
}

fn out_of_range(expected: &str, got: i64) -> SqliteServiceError {
    SqliteServiceError::ConversionFailure(format!("integer {got} does not fit in {expected}"))
}

impl FromColumn for i32 {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(0),
            Value::Int(i) => Self::try_from(*i).map_err(|_| out_of_range("i32", *i)),
            other => Err(mismatch("i32", other)),
        }
    }
}

impl FromColumn for i64 {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(0),
            Value::Int(i) => Ok(*i),
            other => Err(mismatch("i64", other)),
        }
    }
}

impl FromColumn for u64 {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(0),
            Value::Int(i) => Self::try_from(*i).map_err(|_| out_of_range("u64", *i)),
            other => Err(mismatch("u64", other)),
        }
    }
}

impl FromColumn for f64 {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(0.0),
            Value::Float(f) => Ok(*f),
            // SQLite freely returns INTEGER for literals like `SELECT 2`.
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl FromColumn for bool {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(false),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(i) => Err(out_of_range("bool", *i)),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromColumn for String {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch("String", other)),
        }
    }
}

impl FromColumn for Vec<u8> {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Blob(b) => Ok(b.clone()),
            other => Err(mismatch("Vec<u8>", other)),
        }
    }
}

impl FromColumn for NaiveDateTime {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Text(s) => Self::parse_from_str(s, TIMESTAMP_FORMAT)
                .or_else(|_| Self::parse_from_str(s, "%F %T"))
                .map_err(|e| {
                    SqliteServiceError::ConversionFailure(format!(
                        "cannot parse {s:?} as timestamp: {e}"
                    ))
                }),
            other => Err(mismatch("NaiveDateTime", other)),
        }
    }
}

impl FromColumn for JsonValue {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| {
                SqliteServiceError::ConversionFailure(format!("cannot parse column as JSON: {e}"))
            }),
            other => Err(mismatch("JSON", other)),
        }
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    fn from_column(value: &Value) -> Result<Self, SqliteServiceError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_column(other).map(Some),
        }
    }
}

macro_rules! impl_from_row_for_tuple {
    ($width:expr => $($t:ident : $idx:tt),+) => {
        impl<$($t: FromColumn),+> FromRow for ($($t,)+) {
            const WIDTH: usize = $width;

            fn from_row(columns: &[Value]) -> Result<Self, SqliteServiceError> {
                if columns.len() != Self::WIDTH {
                    return Err(SqliteServiceError::ConversionFailure(format!(
                        "row has {} columns, destination tuple expects {}",
                        columns.len(),
                        Self::WIDTH
                    )));
                }
                Ok(($($t::from_column(&columns[$idx])?,)+))
            }
        }
    };
}

impl_from_row_for_tuple!(1 => A:0);
impl_from_row_for_tuple!(2 => A:0, B:1);
impl_from_row_for_tuple!(3 => A:0, B:1, C:2);
impl_from_row_for_tuple!(4 => A:0, B:1, C:2, D:3);
impl_from_row_for_tuple!(5 => A:0, B:1, C:2, D:3, E:4);
impl_from_row_for_tuple!(6 => A:0, B:1, C:2, D:3, E:4, F:5);
impl_from_row_for_tuple!(7 => A:0, B:1, C:2, D:3, E:4, F:5, G:6);
impl_from_row_for_tuple!(8 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn integer_widening_across_widths() {
        let row = [Value::Int(1), Value::Int(2), Value::Int(3)];
        let (a, b, c): (i32, i64, u64) = FromRow::from_row(&row).unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[test]
    fn overflow_is_a_conversion_failure_not_truncation() {
        let err = <(i32,)>::from_row(&[Value::Int(3_000_000_000)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailure);

        let err = <(u64,)>::from_row(&[Value::Int(-1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailure);
    }

    #[test]
    fn null_maps_to_element_default() {
        let (n, s): (i64, String) =
            FromRow::from_row(&[Value::Null, Value::Null]).unwrap();
        assert_eq!(n, 0);
        assert_eq!(s, "");
    }

    #[test]
    fn null_maps_to_none_for_option_elements() {
        let (v,): (Option<i64>,) = FromRow::from_row(&[Value::Null]).unwrap();
        assert_eq!(v, None);
        let (v,): (Option<i64>,) = FromRow::from_row(&[Value::Int(9)]).unwrap();
        assert_eq!(v, Some(9));
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let err = <(i64, i64)>::from_row(&[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailure);
        assert!(err.message().contains("expects 2"), "{err}");
    }

    #[test]
    fn text_into_integer_is_rejected() {
        let err = <(i64,)>::from_row(&[Value::Text("abc".into())]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailure);
    }
}
