//! Purpose: Public immutable table handle over a columnar store.
//! Exports: `Table`, `HeadOptions`.
//! Role: Facade delegating to the store builder, slice engine, mutate engine, and printer.
//! Invariants: A table never changes after construction; every operation returns a new table.
//! Invariants: Derived tables inherit the printer of the table they came from.
//! Invariants: Printing is a side effect only and never changes the returned table.
use std::fmt;
use std::sync::Arc;

use crate::api::printer::{Printer, TextPrinter};
use crate::core::column::Column;
use crate::core::dtype::Dtype;
use crate::core::error::Error;
use crate::core::mutate::{self, ColumnDefs};
use crate::core::slice::{self, RowLimit};
use crate::core::store::{Input, Store};
use crate::core::value::{Record, Value};

/// Options for [`Table::head_with`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeadOptions {
    /// Render the resulting table through the printer.
    pub print: bool,
}

impl HeadOptions {
    pub fn quiet() -> Self {
        Self { print: false }
    }
}

impl Default for HeadOptions {
    fn default() -> Self {
        Self { print: true }
    }
}

#[derive(Clone)]
pub struct Table {
    store: Store,
    printer: Arc<dyn Printer>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("row_count", &self.store.row_count())
            .field("columns", &self.store.column_names())
            .finish()
    }
}

impl Table {
    pub fn create(input: impl Into<Input>) -> Result<Self, Error> {
        Ok(Self::from_store(Store::build(input.into())?))
    }

    pub fn from_records(records: Vec<Record>) -> Result<Self, Error> {
        Self::create(Input::Rows(records))
    }

    pub fn from_columns<I, K>(columns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, Vec<Value>)>,
        K: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();
        Self::create(Input::Columns(columns))
    }

    pub fn from_store(store: Store) -> Self {
        Self {
            store,
            printer: Arc::new(TextPrinter),
        }
    }

    pub fn with_printer(mut self, printer: Arc<dyn Printer>) -> Self {
        self.printer = printer;
        self
    }

    fn derive(&self, store: Store) -> Self {
        Self {
            store,
            printer: Arc::clone(&self.printer),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    pub fn column_names(&self) -> &[String] {
        self.store.column_names()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.store.column(name)
    }

    pub fn dtype_of(&self, column: &str) -> Option<Dtype> {
        self.store.column(column).map(Column::dtype)
    }

    pub fn dtypes(&self) -> Vec<(String, Dtype)> {
        self.store
            .columns()
            .map(|(name, column)| (name.to_string(), column.dtype()))
            .collect()
    }

    /// Rows as records in column order; numeric nulls come back as NaN.
    pub fn to_array(&self) -> Vec<Record> {
        self.store.to_records()
    }

    /// First `n` rows, rendered through the printer.
    pub fn head(&self, n: impl Into<RowLimit>) -> Result<Self, Error> {
        self.head_with(Some(n.into()), HeadOptions::default())
    }

    /// First `n` rows (5 when `None`); prints unless `options.print` is false.
    pub fn head_with(&self, n: Option<RowLimit>, options: HeadOptions) -> Result<Self, Error> {
        let store = slice::head(&self.store, n.unwrap_or_default())?;
        let out = self.derive(store);
        if options.print {
            out.print();
        }
        Ok(out)
    }

    pub fn mutate(&self, defs: &ColumnDefs) -> Result<Self, Error> {
        Ok(self.derive(mutate::apply(&self.store, defs)?))
    }

    /// `mutate` driven by a JSON object of `column -> jq expression`.
    pub fn mutate_json(&self, defs: &serde_json::Value) -> Result<Self, Error> {
        self.mutate(&ColumnDefs::from_json(defs)?)
    }

    pub fn print(&self) -> &Self {
        self.printer.render(self);
        self
    }
}
