//! Purpose: `colframe` CLI entry point; loads JSON tables and runs head/mutate/dtypes.
//! Role: Binary crate root; parses args, builds a table, renders it on stdout.
//! Invariants: Table output goes to stdout; diagnostics and logs go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use colframe::api::{
    ColumnDefs, Dtype, Error, ErrorKind, ExprDef, HeadOptions, JsonPrinter, Printer, RowLimit,
    Table, TextPrinter, to_exit_code,
};
use colframe::ingest::{IngestConfig, IngestMode, read_table};
use serde::Serialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_env("COLFRAME_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Argument)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `colframe <command> --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    dispatch(cli.command, color_mode).map_err(|err| (err, color_mode))
}

fn dispatch(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Head { input, rows, format } => {
            let table = load_table(&input)?.with_printer(printer_for(format, color_mode));
            table.head_with(rows.map(RowLimit::new), HeadOptions::default())?;
            Ok(RunOutcome::ok())
        }
        Command::Mutate {
            input,
            set,
            defs,
            rows,
            format,
        } => {
            let column_defs = build_column_defs(&set, defs.as_deref())?;
            let table = load_table(&input)?
                .with_printer(printer_for(format, color_mode))
                .mutate(&column_defs)?;
            let table = match rows {
                Some(n) => table.head_with(Some(RowLimit::new(n)), HeadOptions::quiet())?,
                None => table,
            };
            table.print();
            Ok(RunOutcome::ok())
        }
        Command::Dtypes { input } => {
            let table = load_table(&input)?;
            let dtypes = table.dtypes();
            let report = DtypesReport {
                rows: table.row_count(),
                columns: dtypes
                    .iter()
                    .map(|(name, dtype)| DtypeEntry {
                        name: name.as_str(),
                        dtype: *dtype,
                    })
                    .collect(),
            };
            let value = serde_json::to_value(&report).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode dtypes")
                    .with_source(err)
            })?;
            emit_json(value);
            Ok(RunOutcome::ok())
        }
    }
}

#[derive(Parser)]
#[command(
    name = "colframe",
    version,
    about = "Columnar tables from JSON: inspect, slice, and recompute columns",
    long_about = None,
    after_help = r#"EXAMPLES
  $ colframe head people.json -n 3
  $ colframe mutate data.jsonl --set 'a=.a * 2' --set 'label=if .a > 2 then "high" else "low" end'
  $ colframe mutate data.json --defs '{"a": ".a + .b"}' --format json
  $ cat data.json | colframe dtypes

Input is a JSON array of records, a JSON object of column arrays, or JSONL records.
Set COLFRAME_LOG=debug to trace engine activity on stderr."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct InputArgs {
    #[arg(
        help = "Input file (JSON or JSONL); omit or use - for stdin",
        value_hint = ValueHint::FilePath
    )]
    file: Option<PathBuf>,
    #[arg(
        long = "in",
        default_value = "auto",
        value_enum,
        help = "Input format: auto|json|jsonl"
    )]
    mode: InputMode,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Show the first rows of a table (default 5)")]
    Head {
        #[command(flatten)]
        input: InputArgs,
        #[arg(
            short = 'n',
            long = "rows",
            allow_negative_numbers = true,
            help = "Number of rows to show (a positive integer)"
        )]
        rows: Option<f64>,
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
    #[command(about = "Recompute existing columns with jq expressions")]
    Mutate {
        #[command(flatten)]
        input: InputArgs,
        #[arg(
            long,
            value_name = "NAME=EXPR",
            help = "Replace column NAME with the value of jq EXPR for each row (repeatable)"
        )]
        set: Vec<String>,
        #[arg(long, value_name = "JSON", help = "JSON object of column name to jq expression")]
        defs: Option<String>,
        #[arg(
            short = 'n',
            long = "head",
            visible_alias = "rows",
            allow_negative_numbers = true,
            help = "Only show the first N rows of the result"
        )]
        rows: Option<f64>,
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
    #[command(about = "Report row count and the inferred dtype of each column")]
    Dtypes {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InputMode {
    Auto,
    Json,
    Jsonl,
}

impl From<InputMode> for IngestMode {
    fn from(mode: InputMode) -> Self {
        match mode {
            InputMode::Auto => IngestMode::Auto,
            InputMode::Json => IngestMode::Json,
            InputMode::Jsonl => IngestMode::Jsonl,
        }
    }
}

#[derive(Serialize)]
struct DtypesReport<'a> {
    rows: usize,
    columns: Vec<DtypeEntry<'a>>,
}

#[derive(Serialize)]
struct DtypeEntry<'a> {
    name: &'a str,
    dtype: Dtype,
}

fn printer_for(format: OutputFormat, color_mode: ColorMode) -> Arc<dyn Printer> {
    match format {
        OutputFormat::Table => Arc::new(TextPrinter),
        OutputFormat::Json => Arc::new(JsonPrinter {
            color: color_mode.use_color(io::stdout().is_terminal()),
        }),
    }
}

fn load_table(input: &InputArgs) -> Result<Table, Error> {
    let config = IngestConfig {
        mode: input.mode.into(),
        ..IngestConfig::default()
    };
    match input.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message(format!("failed to open {}", path.display()))
                    .with_source(err)
            })?;
            read_table(file, config)
        }
        _ => read_table(io::stdin().lock(), config),
    }
}

fn build_column_defs(set: &[String], defs: Option<&str>) -> Result<ColumnDefs, Error> {
    let mut column_defs = match defs {
        Some(text) => {
            let value: Value = serde_json::from_str(text).map_err(|err| {
                Error::new(ErrorKind::Argument)
                    .with_message("--defs is not valid JSON")
                    .with_source(err)
            })?;
            ColumnDefs::from_json(&value)?
        }
        None => ColumnDefs::new(),
    };
    for assignment in set {
        let Some((name, expr)) = assignment.split_once('=') else {
            return Err(Error::new(ErrorKind::Argument)
                .with_message(format!("invalid --set `{assignment}`"))
                .with_hint("Use NAME=EXPR, e.g. --set 'a=.a * 2'"));
        };
        let name = name.trim();
        let compiled = ExprDef::compile(expr).map_err(|err| err.with_column(name))?;
        column_defs.insert(name, compiled);
    }
    if column_defs.is_empty() {
        return Err(Error::new(ErrorKind::Argument)
            .with_message("mutate needs at least one column definition")
            .with_hint("Pass --set NAME=EXPR or --defs '{\"NAME\": \"EXPR\"}'."));
    }
    Ok(column_defs)
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let report = ErrorReport::new(err);
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", report.to_text(color_mode.use_color(is_tty)));
        return;
    }
    let json = serde_json::to_string(&json!({ "error": report })).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

/// Everything reported about a failed command, in both output forms.
#[derive(Debug, Serialize)]
struct ErrorReport {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<String>,
}

impl ErrorReport {
    fn new(err: &Error) -> Self {
        let kind = format!("{:?}", err.kind());
        let mut causes = Vec::new();
        let mut source = StdError::source(err);
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.message().map_or_else(|| kind.clone(), str::to_string),
            kind,
            hint: err.hint().map(str::to_string),
            column: err.column().map(str::to_string),
            line: err.line(),
            causes,
        }
    }

    fn to_text(&self, use_color: bool) -> String {
        let paint = |label: &str, code: &str| {
            if use_color {
                format!("\u{1b}[{code}m{label}\u{1b}[0m")
            } else {
                label.to_string()
            }
        };
        let mut lines = vec![format!("{} {}", paint("error:", "31"), self.message)];
        let context = [
            ("hint:", self.hint.clone()),
            ("column:", self.column.clone()),
            ("line:", self.line.map(|line| line.to_string())),
        ];
        for (label, value) in context {
            if let Some(value) = value {
                lines.push(format!("{} {value}", paint(label, "33")));
            }
        }
        for cause in &self.causes {
            lines.push(format!("{} {cause}", paint("caused by:", "33")));
        }
        lines.join("\n")
    }
}
