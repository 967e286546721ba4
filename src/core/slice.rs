//! Purpose: Leading-rows slice of a store (`head`).
//! Exports: `RowLimit`, `head`.
//! Role: Engine behind `Table::head`; validates the requested count and truncates every column.
//! Invariants: Integer check runs before the positivity check.
//! Invariants: Dtypes are preserved exactly; the source store is untouched.
use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::store::Store;

pub const DEFAULT_HEAD_ROWS: usize = 5;

pub const NON_INTEGER_MESSAGE: &str = "row count must be an integer";
pub const NON_POSITIVE_MESSAGE: &str = "row count must be a positive number";

/// A requested row count, kept as given so validation can report
/// non-integer and non-positive requests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowLimit(f64);

impl RowLimit {
    pub fn new(n: f64) -> Self {
        Self(n)
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Validated count: an integer greater than zero.
    pub fn validate(self) -> Result<usize, Error> {
        let n = self.0;
        if !n.is_finite() || n.fract() != 0.0 {
            return Err(Error::new(ErrorKind::NonInteger).with_message(NON_INTEGER_MESSAGE));
        }
        if n <= 0.0 {
            return Err(Error::new(ErrorKind::NonPositive).with_message(NON_POSITIVE_MESSAGE));
        }
        // Counts beyond usize saturate; the slice clamps to the row count anyway.
        Ok(if n >= usize::MAX as f64 {
            usize::MAX
        } else {
            n as usize
        })
    }
}

impl Default for RowLimit {
    fn default() -> Self {
        Self(DEFAULT_HEAD_ROWS as f64)
    }
}

impl From<f64> for RowLimit {
    fn from(n: f64) -> Self {
        Self(n)
    }
}

impl From<i32> for RowLimit {
    fn from(n: i32) -> Self {
        Self(f64::from(n))
    }
}

impl From<i64> for RowLimit {
    fn from(n: i64) -> Self {
        Self(n as f64)
    }
}

impl From<usize> for RowLimit {
    fn from(n: usize) -> Self {
        Self(n as f64)
    }
}

pub fn head(store: &Store, n: RowLimit) -> Result<Store, Error> {
    let requested = n.validate()?;
    let take = requested.min(store.row_count());
    let columns = store
        .columns()
        .map(|(_, column)| column.prefix(take))
        .collect();
    debug!(
        requested,
        rows = take,
        source_rows = store.row_count(),
        "sliced leading rows"
    );
    Ok(Store::from_parts(
        take,
        store.column_names().to_vec(),
        columns,
    ))
}

#[cfg(test)]
mod tests {
    use super::{NON_INTEGER_MESSAGE, NON_POSITIVE_MESSAGE, RowLimit, head};
    use crate::core::dtype::Dtype;
    use crate::core::error::ErrorKind;
    use crate::core::store::Store;
    use crate::core::value::Value;

    fn store(rows: i32) -> Store {
        Store::from_columns(vec![
            ("n".to_string(), (0..rows).map(Value::from).collect()),
            (
                "s".to_string(),
                (0..rows).map(|i| Value::from(format!("r{i}"))).collect(),
            ),
        ])
        .expect("store")
    }

    #[test]
    fn takes_leading_rows_and_keeps_dtypes() {
        let source = store(10);
        let out = head(&source, RowLimit::from(3)).expect("head");
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.column_names(), source.column_names());
        assert_eq!(out.column("n").expect("n").dtype(), Dtype::Numeric);
        assert_eq!(out.column("s").expect("s").dtype(), Dtype::Text);
        assert_eq!(out.to_records(), source.to_records()[..3].to_vec());
        assert_eq!(source.row_count(), 10);
    }

    #[test]
    fn clamps_to_row_count_and_shares_columns() {
        let source = store(4);
        let out = head(&source, RowLimit::from(20)).expect("head");
        assert_eq!(out.row_count(), 4);
        let shared = out
            .columns()
            .zip(source.columns())
            .all(|((_, a), (_, b))| a.shares_buffer_with(b));
        assert!(shared);
    }

    #[test]
    fn empty_store_stays_empty() {
        let out = head(&Store::default(), RowLimit::from(5)).expect("head");
        assert_eq!(out.row_count(), 0);
    }

    #[test]
    fn rejects_non_positive_counts() {
        for n in [0.0, -1.0] {
            let err = head(&store(2), RowLimit::new(n)).expect_err("non-positive");
            assert_eq!(err.kind(), ErrorKind::NonPositive);
            assert_eq!(err.message(), Some(NON_POSITIVE_MESSAGE));
        }
    }

    #[test]
    fn rejects_non_integer_counts() {
        for n in [2.5, f64::NAN, f64::INFINITY, -0.5] {
            let err = head(&store(2), RowLimit::new(n)).expect_err("non-integer");
            assert_eq!(err.kind(), ErrorKind::NonInteger);
            assert_eq!(err.message(), Some(NON_INTEGER_MESSAGE));
        }
    }

    #[test]
    fn default_limit_is_five() {
        assert_eq!(RowLimit::default().validate().expect("valid"), 5);
    }
}
