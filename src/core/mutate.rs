//! Purpose: Recompute existing columns from per-row definitions (`mutate`).
//! Exports: `ColumnDef`, `ColumnDefs`, `apply`.
//! Role: Engine behind `Table::mutate`; validates, evaluates against one snapshot, re-infers dtypes.
//! Invariants: Validation is exhaustive and finishes before any definition runs.
//! Invariants: Every definition sees the unmodified source store, never a sibling's output.
//! Invariants: Row count and column order are unchanged; untouched columns are shared.
//! Invariants: Any failure returns before a new store exists (no partial application).
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::column::Column;
use crate::core::error::{Error, ErrorKind};
use crate::core::row::Row;
use crate::core::store::Store;
use crate::core::value::Value;
use crate::expr::ExprDef;

/// Computes one cell of a column from a row of the source store.
pub trait ColumnDef: Send + Sync {
    fn compute(&self, row: &Row<'_>) -> Result<Value, Error>;
}

impl<F, V> ColumnDef for F
where
    F: Fn(&Row<'_>) -> V + Send + Sync,
    V: Into<Value>,
{
    fn compute(&self, row: &Row<'_>) -> Result<Value, Error> {
        Ok(self(row).into())
    }
}

/// Ordered mapping of column name to definition. Inserting a name twice
/// replaces the earlier definition.
#[derive(Clone, Default)]
pub struct ColumnDefs {
    defs: Vec<(String, Arc<dyn ColumnDef>)>,
}

impl fmt::Debug for ColumnDefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.defs.iter().map(|(name, _)| name))
            .finish()
    }
}

impl ColumnDefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, def: impl ColumnDef + 'static) -> Self {
        self.insert(name, def);
        self
    }

    /// Same as [`ColumnDefs::with`], with the closure signature spelled out for inference.
    pub fn with_fn<F, V>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Row<'_>) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.with(name, f)
    }

    pub fn insert(&mut self, name: impl Into<String>, def: impl ColumnDef + 'static) {
        let name = name.into();
        let def: Arc<dyn ColumnDef> = Arc::new(def);
        match self.defs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = def,
            None => self.defs.push((name, def)),
        }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|(name, _)| name.as_str())
    }

    /// Parses a JSON object of `name -> jq expression`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, Error> {
        let serde_json::Value::Object(map) = value else {
            return Err(Error::new(ErrorKind::Argument)
                .with_message("column definitions must be a mapping of column name to expression")
                .with_hint(format!(
                    "Got {}. Example: {{\"a\": \".a * 2\"}}",
                    json_kind(value)
                )));
        };
        if let Some((name, def)) = map.iter().find(|(_, def)| !def.is_string()) {
            return Err(Error::new(ErrorKind::Argument)
                .with_message("column definition must be an expression")
                .with_column(name.clone())
                .with_hint(format!("Got {}; wrap the expression in a string.", json_kind(def))));
        }

        let mut defs = Self::new();
        for (name, def) in map {
            let expr = def.as_str().unwrap_or_default();
            let compiled = ExprDef::compile(expr).map_err(|err| err.with_column(name.clone()))?;
            defs.insert(name.clone(), compiled);
        }
        Ok(defs)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn validate(store: &Store, defs: &ColumnDefs) -> Result<(), Error> {
    let unknown: Vec<&str> = defs.names().filter(|name| !store.has_column(name)).collect();
    let Some(first) = unknown.first() else {
        return Ok(());
    };
    Err(Error::new(ErrorKind::UnknownColumn)
        .with_message("mutate can only replace existing columns")
        .with_column(*first)
        .with_hint(format!(
            "Unknown: {}. Available: {}.",
            unknown.join(", "),
            store.column_names().join(", ")
        )))
}

pub fn apply(store: &Store, defs: &ColumnDefs) -> Result<Store, Error> {
    validate(store, defs)?;

    let rows: Vec<Row<'_>> = (0..store.row_count())
        .filter_map(|index| Row::at(store, index))
        .collect();

    let mut replaced = Vec::with_capacity(defs.len());
    for (name, def) in &defs.defs {
        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let value = def
                .compute(row)
                .map_err(|err| err.with_column(name.clone()))?;
            values.push(value);
        }
        replaced.push((name.as_str(), Column::from_values(values)?));
    }

    let mut columns: Vec<Column> = store.columns().map(|(_, column)| column.clone()).collect();
    for (name, column) in replaced {
        let Some(idx) = store.column_index(name) else {
            return Err(Error::new(ErrorKind::Internal)
                .with_message("validated column disappeared")
                .with_column(name));
        };
        let before = columns[idx].dtype();
        if before != column.dtype() {
            debug!(column = name, from = %before, to = %column.dtype(), "column dtype changed");
        }
        columns[idx] = column;
    }

    debug!(
        rows = store.row_count(),
        replaced = defs.len(),
        "mutated columns"
    );
    Ok(Store::from_parts(
        store.row_count(),
        store.column_names().to_vec(),
        columns,
    ))
}
