//! Purpose: Parse JSON / JSONL byte streams into table construction input.
//! Exports: `IngestMode`, `IngestConfig`, `read_input`, `read_table`.
//! Role: Input boundary used by the CLI; keeps format heuristics out of the core.
//! Invariants: Auto detection is deterministic and looks only at the first two complete lines.
//! Invariants: Object key order from the input becomes column order.
//! Invariants: Blank input is an empty table in every mode.
//! Invariants: JSONL records are bounded by `max_record_bytes`, JSON documents by
//! `max_document_bytes`; failures carry a 1-based line.
use std::io::Read;

use bstr::ByteSlice;
use tracing::debug;

use crate::api::Table;
use crate::core::error::{Error, ErrorKind};
use crate::core::store::Input;
use crate::core::value::{Record, Value};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IngestMode {
    Auto,
    /// One JSON document: an array of records, an object of column arrays, or a single record.
    Json,
    /// One JSON object per line; blank lines are skipped.
    Jsonl,
}

#[derive(Copy, Clone, Debug)]
pub struct IngestConfig {
    pub mode: IngestMode,
    pub max_record_bytes: usize,
    pub max_document_bytes: usize,
    pub max_snippet_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            mode: IngestMode::Auto,
            max_record_bytes: 1024 * 1024,
            max_document_bytes: 256 * 1024 * 1024,
            max_snippet_bytes: 120,
        }
    }
}

pub fn read_table<R: Read>(reader: R, config: IngestConfig) -> Result<Table, Error> {
    Table::create(read_input(reader, config)?)
}

pub fn read_input<R: Read>(mut reader: R, config: IngestConfig) -> Result<Input, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read input")
            .with_source(err)
    })?;
    if buf.trim().is_empty() {
        debug!(mode = ?config.mode, "empty input");
        return Ok(Input::Rows(Vec::new()));
    }

    let mode = match config.mode {
        IngestMode::Auto => detect_mode(&buf),
        mode => mode,
    };
    debug!(bytes = buf.len(), ?mode, "ingesting input");
    match mode {
        IngestMode::Jsonl => parse_jsonl(&buf, &config),
        IngestMode::Json | IngestMode::Auto => parse_json(&buf, &config),
    }
}

fn detect_mode(buf: &[u8]) -> IngestMode {
    let trimmed = buf.trim_start();
    if trimmed.starts_with(b"[") {
        return IngestMode::Json;
    }
    // A complete object on the first line followed by another object means one record per line.
    let mut lines = trimmed.lines().filter(|line| !line.trim().is_empty());
    let first = lines.next().map(|line| line.trim());
    let second = lines.next().map(|line| line.trim());
    match (first, second) {
        (Some(first), Some(second)) if first.ends_with(b"}") && second.starts_with(b"{") => {
            IngestMode::Jsonl
        }
        _ => IngestMode::Json,
    }
}

fn parse_json(buf: &[u8], config: &IngestConfig) -> Result<Input, Error> {
    if buf.len() > config.max_document_bytes {
        return Err(parse_error(
            &format!("document exceeds {} bytes", config.max_document_bytes),
            config,
            buf,
        )
        .with_line(1));
    }
    let value: serde_json::Value = serde_json::from_slice(buf).map_err(|err| {
        parse_error("invalid JSON input", config, buf)
            .with_line(err.line() as u64)
            .with_source(err)
    })?;
    match value {
        serde_json::Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let serde_json::Value::Object(map) = item else {
                    return Err(Error::new(ErrorKind::Parse)
                        .with_message(format!("array element {idx} is not a JSON object"))
                        .with_hint("Row-oriented input must be an array of objects."));
                };
                records.push(Record::from_json_object(map));
            }
            Ok(Input::Rows(records))
        }
        serde_json::Value::Object(map) if !map.is_empty() && map.values().all(|v| v.is_array()) => {
            let columns = map
                .iter()
                .map(|(name, values)| {
                    let values = values
                        .as_array()
                        .map(|items| items.iter().map(Value::from_json).collect())
                        .unwrap_or_default();
                    (name.clone(), values)
                })
                .collect();
            Ok(Input::Columns(columns))
        }
        serde_json::Value::Object(map) => Ok(Input::Rows(vec![Record::from_json_object(&map)])),
        _ => Err(Error::new(ErrorKind::Parse)
            .with_message("JSON input must be an array or an object")
            .with_hint("Use an array of records or an object of column arrays.")),
    }
}

fn parse_jsonl(buf: &[u8], config: &IngestConfig) -> Result<Input, Error> {
    let mut records = Vec::new();
    for (idx, line) in buf.lines().enumerate() {
        let line_no = idx as u64 + 1;
        if line.trim().is_empty() {
            continue;
        }
        if line.len() > config.max_record_bytes {
            return Err(parse_error(
                &format!("record exceeds {} bytes", config.max_record_bytes),
                config,
                line,
            )
            .with_line(line_no));
        }
        let value: serde_json::Value = serde_json::from_slice(line).map_err(|err| {
            parse_error("invalid JSON record", config, line)
                .with_line(line_no)
                .with_source(err)
        })?;
        let serde_json::Value::Object(map) = value else {
            return Err(
                parse_error("record is not a JSON object", config, line).with_line(line_no)
            );
        };
        records.push(Record::from_json_object(&map));
    }
    Ok(Input::Rows(records))
}

fn parse_error(message: &str, config: &IngestConfig, input: &[u8]) -> Error {
    Error::new(ErrorKind::Parse)
        .with_message(message)
        .with_hint(format!(
            "Input starts with: {}",
            truncate_snippet(input, config.max_snippet_bytes)
        ))
}

fn truncate_snippet(input: &[u8], max: usize) -> String {
    let trimmed = input.trim();
    // Decode only a bounded prefix of large inputs.
    let text = trimmed[..trimmed.len().min(max.saturating_mul(4))].to_str_lossy();
    if text.len() <= max {
        return text.into_owned();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
