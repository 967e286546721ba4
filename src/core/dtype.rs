//! Purpose: Decide the storage dtype of a column from its values.
//! Exports: `Dtype`, `infer`, `coerce_numeric`.
//! Role: Single classification policy used by store construction and `mutate`.
//! Invariants: Dtypes are totally ordered `Numeric < Text < Other`; `infer` returns the maximum seen.
//! Invariants: Nulls never raise the dtype; an empty or all-null sequence is `Numeric`.
use std::fmt;

use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::value::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Numeric,
    Text,
    Other,
}

impl Dtype {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Other => "other",
        }
    }

    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(_) => Some(Self::Numeric),
            Value::Text(_) => Some(Self::Text),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => Some(Self::Other),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn infer<'a, I>(values: I) -> Dtype
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut dtype = Dtype::Numeric;
    for value in values {
        if let Some(seen) = Dtype::of(value) {
            dtype = dtype.max(seen);
            if dtype == Dtype::Other {
                break;
            }
        }
    }
    dtype
}

/// Maps a value into the numeric buffer representation (null becomes NaN).
pub fn coerce_numeric(value: &Value) -> Result<f64, Error> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => Ok(*n),
        other => Err(Error::new(ErrorKind::Internal)
            .with_message("non-numeric value in numeric column")
            .with_hint(format!("Value {other} should have been classified by infer."))),
    }
}

#[cfg(test)]
mod tests {
    use super::{Dtype, coerce_numeric, infer};
    use crate::core::value::Value;

    fn values(items: &[Value]) -> Dtype {
        infer(items.iter())
    }

    #[test]
    fn numbers_and_nulls_are_numeric() {
        assert_eq!(
            values(&[Value::from(1), Value::Null, Value::Number(f64::NAN)]),
            Dtype::Numeric
        );
    }

    #[test]
    fn empty_and_all_null_are_numeric() {
        assert_eq!(values(&[]), Dtype::Numeric);
        assert_eq!(values(&[Value::Null, Value::Null]), Dtype::Numeric);
    }

    #[test]
    fn one_string_makes_the_column_text() {
        assert_eq!(
            values(&[Value::from(1), Value::from("2"), Value::from(3)]),
            Dtype::Text
        );
    }

    #[test]
    fn other_dominates_text() {
        assert_eq!(values(&[Value::from("a"), Value::from(true)]), Dtype::Other);
        assert_eq!(values(&[Value::from(1), Value::from(false)]), Dtype::Other);
    }

    #[test]
    fn dtype_order_is_numeric_text_other() {
        assert!(Dtype::Numeric < Dtype::Text);
        assert!(Dtype::Text < Dtype::Other);
    }

    #[test]
    fn coerce_maps_null_to_nan() {
        assert!(coerce_numeric(&Value::Null).expect("null").is_nan());
        assert_eq!(coerce_numeric(&Value::from(4)).expect("number"), 4.0);
        assert!(coerce_numeric(&Value::from("x")).is_err());
    }
}
