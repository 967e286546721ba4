//! Purpose: Define the stable public Rust API boundary for colframe.
//! Exports: `Table`, printers, and the core types callers need to build and transform tables.
//! Role: Public, additive-only surface; storage internals stay reachable only through `core`.
//! Invariants: Everything a caller needs for create/head/mutate/print is re-exported here.

mod printer;
mod table;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::column::{Buffer, Column};
pub use crate::core::dtype::Dtype;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::mutate::{ColumnDef, ColumnDefs};
pub use crate::core::row::Row;
pub use crate::core::slice::{DEFAULT_HEAD_ROWS, RowLimit};
pub use crate::core::store::{Input, Store};
pub use crate::core::value::{Record, Value};
pub use crate::expr::ExprDef;
pub use printer::{JsonPrinter, Printer, TextPrinter, render_json, render_text};
pub use table::{HeadOptions, Table};
