//! Purpose: Immutable columnar container built from row- or column-oriented input.
//! Exports: `Store`, `Input`.
//! Role: The storage value every `Table` owns; transforms derive new stores from it.
//! Invariants: Every column holds exactly `row_count` cells.
//! Invariants: Column order is the input order and never changes in derived stores.
//! Invariants: A published store is never mutated; derived stores share unaffected columns.
use tracing::debug;

use crate::core::column::Column;
use crate::core::error::{Error, ErrorKind};
use crate::core::value::{Record, Value};

/// Raw construction input.
#[derive(Clone, Debug)]
pub enum Input {
    /// Ordered records; the first record's keys define the columns.
    Rows(Vec<Record>),
    /// Ordered `(name, values)` pairs of equal length.
    Columns(Vec<(String, Vec<Value>)>),
}

impl From<Vec<Record>> for Input {
    fn from(records: Vec<Record>) -> Self {
        Self::Rows(records)
    }
}

impl From<Vec<(String, Vec<Value>)>> for Input {
    fn from(columns: Vec<(String, Vec<Value>)>) -> Self {
        Self::Columns(columns)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Store {
    row_count: usize,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Store {
    pub fn build(input: Input) -> Result<Self, Error> {
        match input {
            Input::Rows(records) => Self::from_records(&records),
            Input::Columns(columns) => Self::from_columns(columns),
        }
    }

    /// Row-oriented construction. Fields missing from later records read as null;
    /// fields absent from the first record are ignored.
    pub fn from_records(records: &[Record]) -> Result<Self, Error> {
        let Some(first) = records.first() else {
            return Ok(Self::default());
        };
        let names: Vec<String> = first.keys().map(str::to_string).collect();
        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            let values = records
                .iter()
                .map(|record| record.get(name).cloned().unwrap_or(Value::Null))
                .collect();
            columns.push(Column::from_values(values)?);
        }
        let store = Self {
            row_count: records.len(),
            names,
            columns,
        };
        debug!(
            rows = store.row_count,
            columns = store.names.len(),
            "built store from records"
        );
        Ok(store)
    }

    /// Column-oriented construction. All sequences must have the same length.
    pub fn from_columns(input: Vec<(String, Vec<Value>)>) -> Result<Self, Error> {
        let row_count = input.first().map_or(0, |(_, values)| values.len());
        for (idx, (name, values)) in input.iter().enumerate() {
            if values.len() != row_count {
                return Err(Error::new(ErrorKind::Shape)
                    .with_message(format!(
                        "column has {} values, expected {row_count}",
                        values.len()
                    ))
                    .with_column(name.clone())
                    .with_hint("All column sequences must have the same length."));
            }
            if input[..idx].iter().any(|(seen, _)| seen == name) {
                return Err(Error::new(ErrorKind::Shape)
                    .with_message("duplicate column name")
                    .with_column(name.clone()));
            }
        }

        let mut names = Vec::with_capacity(input.len());
        let mut columns = Vec::with_capacity(input.len());
        for (name, values) in input {
            columns.push(Column::from_values(values)?);
            names.push(name);
        }
        debug!(
            rows = row_count,
            columns = names.len(),
            "built store from columns"
        );
        Ok(Self {
            row_count,
            names,
            columns,
        })
    }

    /// Assembles a derived store. Callers guarantee every column has `row_count` cells.
    pub(crate) fn from_parts(row_count: usize, names: Vec<String>, columns: Vec<Column>) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|column| column.len() == row_count));
        Self {
            row_count,
            names,
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    pub fn record(&self, index: usize) -> Option<Record> {
        if index >= self.row_count {
            return None;
        }
        let fields = self
            .columns()
            .map(|(name, column)| (name.to_string(), column.get(index).unwrap_or_default()))
            .collect();
        Some(Record::from_unique_fields(fields))
    }

    pub fn to_records(&self) -> Vec<Record> {
        (0..self.row_count)
            .filter_map(|index| self.record(index))
            .collect()
    }
}
