//! Purpose: Rendering strategies for tables (aligned text and pretty/colored JSON).
//! Exports: `Printer`, `TextPrinter`, `JsonPrinter`, `render_text`, `render_json`.
//! Role: Injectable collaborator invoked by `Table::print` and `Table::head`.
//! Invariants: Rendering never alters the table it renders.
//! Invariants: ANSI escapes appear only when explicitly enabled.
//! Invariants: Text output shows numeric nulls as `NaN`, matching `to_array`.
//! Invariants: JSON output is always valid JSON; non-finite numbers render as `null`.
use crate::api::table::Table;
use crate::core::value::Value;

const INDENT: &str = "  ";

// Conservative 8/16-color palette for broad terminal compatibility.
const COLOR_KEY: &str = "36";
const COLOR_STRING: &str = "32";
const COLOR_NUMBER: &str = "33";
const COLOR_BOOL: &str = "35";
const COLOR_NULL: &str = "39";
const COLOR_PUNCT: &str = "39";

/// Side-effecting renderer for a table.
pub trait Printer: Send + Sync {
    fn render(&self, table: &Table);
}

/// Aligned, two-space separated text table on stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextPrinter;

impl Printer for TextPrinter {
    fn render(&self, table: &Table) {
        println!("{}", render_text(table));
    }
}

/// Pretty JSON array of records on stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPrinter {
    pub color: bool,
}

impl Printer for JsonPrinter {
    fn render(&self, table: &Table) {
        println!("{}", render_json(table, self.color));
    }
}

pub fn render_text(table: &Table) -> String {
    let footer = format!(
        "[{} rows x {} columns]",
        table.row_count(),
        table.column_names().len()
    );
    let header: Vec<String> = table
        .dtypes()
        .into_iter()
        .map(|(name, dtype)| format!("{name}:{dtype}"))
        .collect();
    if header.is_empty() {
        return footer;
    }

    let mut lines = vec![header];
    lines.extend(
        table
            .to_array()
            .iter()
            .map(|record| record.iter().map(|(_, value)| cell_text(value)).collect()),
    );
    let mut widths = vec![0; lines[0].len()];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in &lines {
        let last = line.len().saturating_sub(1);
        for (idx, (cell, width)) in line.iter().zip(widths.iter().copied()).enumerate() {
            if idx == last {
                out.push_str(cell);
            } else {
                out.push_str(&format!("{cell:<width$}  "));
            }
        }
        out.push('\n');
    }
    out.push_str(&footer);
    out
}

/// One cell of the text table; line breaks are escaped to keep rows on one line.
fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::Text(text) => text.clone(),
        other => other.to_string(),
    };
    text.replace('\n', "\\n").replace('\r', "\\r")
}

pub fn render_json(table: &Table, use_color: bool) -> String {
    let mut out = String::new();
    let records: Vec<Value> = table.to_array().into_iter().map(Value::from).collect();
    write_block(
        ('[', ']'),
        records.iter().map(|value| (None, value)),
        records.len(),
        0,
        use_color,
        &mut out,
    );
    out
}

fn write_value(value: &Value, indent: usize, use_color: bool, out: &mut String) {
    match value {
        Value::Null => push_colored("null", COLOR_NULL, use_color, out),
        Value::Bool(val) => {
            let text = if *val { "true" } else { "false" };
            push_colored(text, COLOR_BOOL, use_color, out);
        }
        Value::Number(num) if !num.is_finite() => push_colored("null", COLOR_NULL, use_color, out),
        Value::Number(num) => push_colored(&num.to_string(), COLOR_NUMBER, use_color, out),
        Value::Text(text) => push_colored(&json_string(text), COLOR_STRING, use_color, out),
        Value::Array(items) => write_block(
            ('[', ']'),
            items.iter().map(|item| (None, item)),
            items.len(),
            indent,
            use_color,
            out,
        ),
        Value::Object(record) => write_block(
            ('{', '}'),
            record.iter().map(|(key, value)| (Some(key), value)),
            record.len(),
            indent,
            use_color,
            out,
        ),
    }
}

/// Writes an array (entries without keys) or an object, one entry per line.
fn write_block<'a>(
    (open, close): (char, char),
    entries: impl Iterator<Item = (Option<&'a str>, &'a Value)>,
    len: usize,
    indent: usize,
    use_color: bool,
    out: &mut String,
) {
    if len == 0 {
        push_colored(&format!("{open}{close}"), COLOR_PUNCT, use_color, out);
        return;
    }
    push_colored(&open.to_string(), COLOR_PUNCT, use_color, out);
    out.push('\n');
    for (idx, (key, value)) in entries.enumerate() {
        push_indent(indent + 1, out);
        if let Some(key) = key {
            push_colored(&json_string(key), COLOR_KEY, use_color, out);
            push_colored(":", COLOR_PUNCT, use_color, out);
            out.push(' ');
        }
        write_value(value, indent + 1, use_color, out);
        if idx + 1 < len {
            push_colored(",", COLOR_PUNCT, use_color, out);
        }
        out.push('\n');
    }
    push_indent(indent, out);
    push_colored(&close.to_string(), COLOR_PUNCT, use_color, out);
}

fn json_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn push_colored(text: &str, color: &str, use_color: bool, out: &mut String) {
    if !use_color {
        out.push_str(text);
        return;
    }
    out.push_str("\u{1b}[");
    out.push_str(color);
    out.push('m');
    out.push_str(text);
    out.push_str("\u{1b}[0m");
}
