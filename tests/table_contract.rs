//! Contract tests for the public table API: construction, head, mutate, printing.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colframe::api::{
    ColumnDefs, Dtype, ErrorKind, HeadOptions, Printer, Record, RowLimit, Table, Value,
};
use serde_json::json;

#[derive(Default)]
struct CountingPrinter {
    calls: AtomicUsize,
    last_rows: AtomicUsize,
}

impl Printer for CountingPrinter {
    fn render(&self, table: &Table) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_rows.store(table.row_count(), Ordering::SeqCst);
    }
}

fn abc() -> Table {
    Table::from_columns([
        ("a", vec![Value::from(1), Value::from(2), Value::from(3)]),
        ("b", vec![Value::from(10), Value::from(20), Value::from(30)]),
    ])
    .expect("table")
}

fn numbers(table: &Table, column: &str) -> Vec<f64> {
    table
        .column(column)
        .and_then(|c| c.as_numeric())
        .expect("numeric column")
        .to_vec()
}

fn people() -> Vec<Record> {
    vec![
        Record::new().with("name", "Alice").with("age", 30).with("city", "Oslo"),
        Record::new().with("name", "Bob").with("age", 41).with("city", "Lima"),
        Record::new().with("name", "Chen").with("age", 25).with("city", "Pune"),
        Record::new().with("name", "Dana").with("age", 52).with("city", "Kyiv"),
        Record::new().with("name", "Eli").with("age", 19).with("city", "Rome"),
        Record::new().with("name", "Fay").with("age", 33).with("city", "Nice"),
        Record::new().with("name", "Gus").with("age", 47).with("city", "Bern"),
    ]
}

#[test]
fn row_oriented_input_round_trips_through_to_array() {
    let records = people();
    let table = Table::from_records(records.clone()).expect("table");
    assert_eq!(table.to_array(), records);
    assert_eq!(table.column_names(), ["name", "age", "city"]);
    assert_eq!(
        table.dtypes(),
        vec![
            ("name".to_string(), Dtype::Text),
            ("age".to_string(), Dtype::Numeric),
            ("city".to_string(), Dtype::Text),
        ]
    );
}

#[test]
fn nested_records_round_trip_with_key_order() {
    let records = vec![
        Record::new().with("id", 1).with(
            "meta",
            Record::new().with("z", "last-alpha").with("a", Record::new().with("y", true)),
        ),
        Record::new().with("id", 2).with("meta", Record::new().with("k", 0)),
    ];
    let table = Table::from_records(records.clone()).expect("table");
    assert_eq!(table.dtype_of("meta"), Some(Dtype::Other));
    let out = table.to_array();
    assert_eq!(out, records);
    let Some(Value::Object(meta)) = out[0].get("meta") else {
        panic!("expected nested object");
    };
    assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["z", "a"]);
}

#[test]
fn head_keeps_leading_rows_and_leaves_source_untouched() {
    let records = people();
    let table = Table::from_records(records.clone()).expect("table");
    for n in [1_usize, 3, 7, 20] {
        let out = table
            .head_with(Some(RowLimit::from(n)), HeadOptions::quiet())
            .expect("head");
        let expected = n.min(records.len());
        assert_eq!(out.row_count(), expected);
        assert_eq!(out.to_array(), records[..expected].to_vec());
        assert_eq!(out.column_names(), table.column_names());
    }
    assert_eq!(table.row_count(), 7);
    assert_eq!(table.to_array(), records);
}

#[test]
fn head_rejects_non_positive_and_fractional_counts() {
    let table = abc();
    for n in [0.0, -1.0] {
        let err = table
            .head_with(Some(RowLimit::new(n)), HeadOptions::quiet())
            .expect_err("non-positive");
        assert_eq!(err.kind(), ErrorKind::NonPositive);
        assert_eq!(err.message(), Some("row count must be a positive number"));
    }
    let err = table
        .head_with(Some(RowLimit::new(2.5)), HeadOptions::quiet())
        .expect_err("non-integer");
    assert_eq!(err.kind(), ErrorKind::NonInteger);
    assert_eq!(err.message(), Some("row count must be an integer"));
}

#[test]
fn head_prints_by_default_and_only_when_asked() {
    let printer = Arc::new(CountingPrinter::default());
    let table = Table::from_records(people())
        .expect("table")
        .with_printer(printer.clone());

    let out = table.head_with(None, HeadOptions::default()).expect("head");
    assert_eq!(out.row_count(), 5);
    assert_eq!(printer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(printer.last_rows.load(Ordering::SeqCst), 5);

    let quiet = table
        .head_with(Some(RowLimit::from(2)), HeadOptions::quiet())
        .expect("head");
    assert_eq!(printer.calls.load(Ordering::SeqCst), 1);

    quiet.print();
    assert_eq!(printer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(printer.last_rows.load(Ordering::SeqCst), 2);

    table.head(3).expect("head");
    assert_eq!(printer.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn mutate_doubles_a_column_and_keeps_others() {
    let table = abc();
    let defs = ColumnDefs::new().with_fn("a", |row| row.number("a") * 2.0);
    let out = table.mutate(&defs).expect("mutate");
    assert_eq!(numbers(&out, "a"), vec![2.0, 4.0, 6.0]);
    assert_eq!(out.dtype_of("a"), Some(Dtype::Numeric));
    assert_eq!(numbers(&out, "b"), vec![10.0, 20.0, 30.0]);
    assert_eq!(out.row_count(), table.row_count());
    assert_eq!(out.column_names(), table.column_names());
    assert_eq!(numbers(&table, "a"), vec![1.0, 2.0, 3.0]);
}

#[test]
fn mutate_reads_other_columns_of_the_same_row() {
    let defs = ColumnDefs::new().with_fn("a", |row| row.number("a") + row.number("b"));
    let out = abc().mutate(&defs).expect("mutate");
    assert_eq!(numbers(&out, "a"), vec![11.0, 22.0, 33.0]);
}

#[test]
fn mutate_null_results_become_nan_in_numeric_columns() {
    let defs = ColumnDefs::new().with_fn("a", |row| {
        let a = row.number("a");
        if a > 1.0 { Some(a) } else { None }
    });
    let out = abc().mutate(&defs).expect("mutate");
    assert_eq!(out.dtype_of("a"), Some(Dtype::Numeric));
    let a = numbers(&out, "a");
    assert!(a[0].is_nan());
    assert_eq!(&a[1..], &[2.0, 3.0]);
}

#[test]
fn mutate_reinfers_dtype_when_values_become_text() {
    let defs =
        ColumnDefs::new().with_fn("a", |row| if row.number("a") > 2.0 { "high" } else { "low" });
    let out = abc().mutate(&defs).expect("mutate");
    assert_eq!(out.dtype_of("a"), Some(Dtype::Text));
    let column = out.column("a").expect("column");
    assert_eq!(
        column.values(),
        vec![Value::from("low"), Value::from("low"), Value::from("high")]
    );
}

#[test]
fn mutate_json_runs_expressions() {
    let out = abc()
        .mutate_json(&json!({"a": ".a + .b", "b": "if .a > 2 then \"high\" else \"low\" end"}))
        .expect("mutate");
    assert_eq!(numbers(&out, "a"), vec![11.0, 22.0, 33.0]);
    assert_eq!(out.dtype_of("b"), Some(Dtype::Text));
}

#[test]
fn invalid_definitions_fail_before_anything_is_computed() {
    let printer = Arc::new(CountingPrinter::default());
    let table = abc().with_printer(printer.clone());

    for defs in [json!(null), json!("not an object"), json!(123), json!({"a": 100})] {
        let err = table.mutate_json(&defs).expect_err("invalid defs");
        assert_eq!(err.kind(), ErrorKind::Argument, "defs: {defs}");
    }

    let err = table
        .mutate_json(&json!({"missing": ".a"}))
        .expect_err("unknown column");
    assert_eq!(err.kind(), ErrorKind::UnknownColumn);

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let defs = ColumnDefs::new()
        .with_fn("a", move |row| {
            seen.fetch_add(1, Ordering::SeqCst);
            row.number("a")
        })
        .with_fn("missing", |_row| 0.0);
    let err = table.mutate(&defs).expect_err("unknown column");
    assert_eq!(err.kind(), ErrorKind::UnknownColumn);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(printer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(numbers(&table, "a"), vec![1.0, 2.0, 3.0]);
}

#[test]
fn failing_expression_reports_the_column_and_publishes_nothing() {
    let table = Table::from_records(vec![
        Record::new().with("a", 1).with("s", "x"),
        Record::new().with("a", 2).with("s", "y"),
    ])
    .expect("table");
    let err = table
        .mutate_json(&json!({"a": ".s - 1"}))
        .expect_err("eval failure");
    assert_eq!(err.kind(), ErrorKind::Eval);
    assert_eq!(err.column(), Some("a"));
    assert_eq!(numbers(&table, "a"), vec![1.0, 2.0]);
}

#[test]
fn ragged_column_input_is_a_shape_error() {
    let err = Table::from_columns([
        ("a", vec![Value::from(1), Value::from(2)]),
        ("b", vec![Value::from(1)]),
    ])
    .expect_err("shape");
    assert_eq!(err.kind(), ErrorKind::Shape);
}
