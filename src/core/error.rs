//! Purpose: Single error type shared by the table engine, ingestion, and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Builder-style error carrying a kind plus optional context fields.
//! Invariants: `message()` returns the exact caller-facing condition text.
//! Invariants: Exit code mapping is stable; new kinds are appended, never renumbered.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Argument,
    UnknownColumn,
    NonPositive,
    NonInteger,
    Shape,
    Eval,
    Parse,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    column: Option<String>,
    line: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            column: None,
            line: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn line(&self) -> Option<u64> {
        self.line
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column: {column})")?;
        }
        if let Some(line) = self.line {
            write!(f, " (line: {line})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Argument => 2,
        ErrorKind::UnknownColumn => 3,
        ErrorKind::NonPositive => 4,
        ErrorKind::NonInteger => 5,
        ErrorKind::Shape => 6,
        ErrorKind::Eval => 7,
        ErrorKind::Parse => 8,
        ErrorKind::Io => 9,
    }
}
