//! Purpose: One typed, reference-counted column buffer.
//! Exports: `Column`, `Buffer`.
//! Role: Storage unit of a `Store`; immutable once built and cheap to share between stores.
//! Invariants: A `Numeric` column holds `f64` with NaN as the null sentinel.
//! Invariants: `Text`/`Other` columns hold values verbatim, nulls included.
use std::sync::Arc;

use crate::core::dtype::{self, Dtype};
use crate::core::error::Error;
use crate::core::value::Value;

#[derive(Clone, Debug)]
pub enum Buffer {
    Numeric(Arc<[f64]>),
    Values(Arc<[Value]>),
}

#[derive(Clone, Debug)]
pub struct Column {
    dtype: Dtype,
    buffer: Buffer,
}

impl Column {
    /// Classifies `values` and builds the matching buffer.
    pub fn from_values(values: Vec<Value>) -> Result<Self, Error> {
        let dtype = dtype::infer(values.iter());
        let buffer = match dtype {
            Dtype::Numeric => Buffer::Numeric(
                values
                    .iter()
                    .map(dtype::coerce_numeric)
                    .collect::<Result<Arc<[f64]>, Error>>()?,
            ),
            Dtype::Text | Dtype::Other => Buffer::Values(Arc::from(values)),
        };
        Ok(Self { dtype, buffer })
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        match &self.buffer {
            Buffer::Numeric(data) => data.len(),
            Buffer::Values(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.buffer {
            Buffer::Numeric(data) => Some(data),
            Buffer::Values(_) => None,
        }
    }

    /// Decodes one cell. A numeric null comes back as NaN, not null.
    pub fn get(&self, index: usize) -> Option<Value> {
        match &self.buffer {
            Buffer::Numeric(data) => data.get(index).map(|n| Value::Number(*n)),
            Buffer::Values(data) => data.get(index).cloned(),
        }
    }

    pub fn values(&self) -> Vec<Value> {
        match &self.buffer {
            Buffer::Numeric(data) => data.iter().map(|n| Value::Number(*n)).collect(),
            Buffer::Values(data) => data.to_vec(),
        }
    }

    /// Returns the first `len` cells with the same dtype. Shares the buffer when
    /// nothing would be cut.
    pub fn prefix(&self, len: usize) -> Self {
        if len >= self.len() {
            return self.clone();
        }
        let buffer = match &self.buffer {
            Buffer::Numeric(data) => Buffer::Numeric(Arc::from(&data[..len])),
            Buffer::Values(data) => Buffer::Values(Arc::from(&data[..len])),
        };
        Self {
            dtype: self.dtype,
            buffer,
        }
    }

    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        match (&self.buffer, &other.buffer) {
            (Buffer::Numeric(a), Buffer::Numeric(b)) => Arc::ptr_eq(a, b),
            (Buffer::Values(a), Buffer::Values(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Column;
    use crate::core::dtype::Dtype;
    use crate::core::value::Value;

    #[test]
    fn numeric_column_stores_null_as_nan() {
        let column = Column::from_values(vec![Value::from(1), Value::Null]).expect("column");
        assert_eq!(column.dtype(), Dtype::Numeric);
        let data = column.as_numeric().expect("numeric buffer");
        assert_eq!(data[0], 1.0);
        assert!(data[1].is_nan());
        assert!(column.get(1).expect("cell").is_missing());
    }

    #[test]
    fn text_column_keeps_numbers_and_nulls_verbatim() {
        let column = Column::from_values(vec![Value::from(1), Value::from("a"), Value::Null])
            .expect("column");
        assert_eq!(column.dtype(), Dtype::Text);
        assert!(column.as_numeric().is_none());
        assert_eq!(
            column.values(),
            vec![Value::from(1), Value::from("a"), Value::Null]
        );
    }

    #[test]
    fn prefix_shares_when_not_cut() {
        let column = Column::from_values(vec![Value::from(1), Value::from(2)]).expect("column");
        assert!(column.prefix(2).shares_buffer_with(&column));
        assert!(column.prefix(10).shares_buffer_with(&column));

        let cut = column.prefix(1);
        assert!(!cut.shares_buffer_with(&column));
        assert_eq!(cut.len(), 1);
        assert_eq!(cut.dtype(), Dtype::Numeric);
    }
}
