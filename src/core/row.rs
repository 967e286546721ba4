//! Purpose: Read-only per-index view handed to column definitions.
//! Exports: `Row`.
//! Role: Bridges the row-oriented callback API onto columnar storage.
//! Invariants: A `Row` borrows a published store; it cannot observe a store under construction.
//! Invariants: Numeric nulls decode as NaN; whether a cell was originally null is not recoverable.
use crate::core::store::Store;
use crate::core::value::{Record, Value};

#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    store: &'a Store,
    index: usize,
}

impl<'a> Row<'a> {
    /// Returns `None` when `index` is past the last row.
    pub fn at(store: &'a Store, index: usize) -> Option<Self> {
        (index < store.row_count()).then_some(Self { store, index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn column_names(&self) -> &'a [String] {
        self.store.column_names()
    }

    pub fn try_get(&self, name: &str) -> Option<Value> {
        self.store.column(name)?.get(self.index)
    }

    /// Cell value for `name`; an unknown column reads as null.
    pub fn get(&self, name: &str) -> Value {
        self.try_get(name).unwrap_or_default()
    }

    /// Numeric cell value; NaN when the cell is missing or not a number.
    pub fn number(&self, name: &str) -> f64 {
        self.get(name).as_f64().unwrap_or(f64::NAN)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn to_record(&self) -> Record {
        self.store.record(self.index).unwrap_or_default()
    }

    /// The row as an object value, the input shape for expression definitions.
    pub fn to_value(&self) -> Value {
        let fields = self
            .store
            .columns()
            .map(|(name, column)| (name.to_string(), column.get(self.index).unwrap_or_default()))
            .collect();
        Value::Object(Record::from_unique_fields(fields))
    }
}
