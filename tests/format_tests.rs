use std::fs;
use std::path::PathBuf;

use querycsv::output::{format_csv, format_table, write_csv, CsvFormat, QuoteStyle};
use querycsv::store::{FileLoader, StoreBacking};
use querycsv::{query_csv, ResultSet, Value};
use tempfile::tempdir;

fn foo_csv(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("foo.csv");
    fs::write(&path, "a,b,c\n1,2,3\n").unwrap();
    path
}

#[test]
fn test_pretty_print_select_all() {
    let dir = tempdir().unwrap();
    let result = query_csv("select * from foo", &[foo_csv(dir.path())])
        .unwrap()
        .unwrap();

    assert_eq!(format_table(&result), " a | b | c\n===========\n 1 | 2 | 3\n");
}

#[test]
fn test_pretty_print_count() {
    let dir = tempdir().unwrap();
    let result = query_csv("select count(*) from foo", &[foo_csv(dir.path())])
        .unwrap()
        .unwrap();

    assert_eq!(format_table(&result), " count(*)\n==========\n 1       \n");
}

#[test]
fn test_pretty_print_long_value_sets_width() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.csv");
    fs::write(&path, "id,note\n1,short\n2,this one is rather long\n3,\n").unwrap();

    let result = query_csv("select id, note from notes order by id", &[path])
        .unwrap()
        .unwrap();
    let out = format_table(&result);
    let lines: Vec<&str> = out.lines().collect();

    let width = "this one is rather long".len();
    assert_eq!(lines[0], format!(" id | {:<width$}", "note", width = width));
    assert_eq!(lines[1], "=".repeat(2 + width + 5));
    assert_eq!(lines[4], format!(" 3  | {:<width$}", "NULL", width = width));
}

#[test]
fn test_csv_round_trip() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("people.csv");
    fs::write(
        &source,
        "name,score,born,remark\n\
         \"Smith, Jane\",9.5,1990-04-01,\"said \"\"hello\"\"\"\n\
         Lee,7,1985-12-31,\"multi\nline\"\n\
         Ortiz,,2001-06-15,plain\n",
    )
    .unwrap();

    let original = query_csv("select * from people", &[source]).unwrap().unwrap();

    let exported = dir.path().join("export.csv");
    write_csv(&original, &exported, &CsvFormat::default()).unwrap();

    let reloaded = query_csv("select * from export", &[exported]).unwrap().unwrap();

    assert_eq!(reloaded.column_names, original.column_names);
    assert_eq!(reloaded.row_count(), original.row_count());
    assert_eq!(reloaded.rows, original.rows);
}

#[test]
fn test_round_trip_keeps_reals_real() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("m.csv");
    fs::write(&source, "v\n2.0\n3.5\n").unwrap();

    let original = query_csv("select v from m", &[source]).unwrap().unwrap();
    assert_eq!(original.rows[0][0], Value::Real(2.0));

    let text = format_csv(&original, &CsvFormat::default());
    assert_eq!(text, "v\n2.0\n3.5\n");
}

#[test]
fn test_non_numeric_output_reloads() {
    let dir = tempdir().unwrap();
    let exported = dir.path().join("quoted.csv");
    let result = ResultSet::new(
        vec!["id".to_string(), "name".to_string()],
        vec![
            vec![Value::Integer(1), Value::Text("x".to_string())],
            vec![Value::Integer(2), Value::Null],
        ],
    );
    let format = CsvFormat {
        quote_style: QuoteStyle::NonNumeric,
        ..CsvFormat::default()
    };
    write_csv(&result, &exported, &format).unwrap();

    let mut loader = FileLoader::new(StoreBacking::Memory).unwrap();
    loader.load_file(&exported).unwrap();
    let reloaded = loader
        .store()
        .query("select id, name from quoted order by id")
        .unwrap()
        .unwrap();

    assert_eq!(reloaded, result);
}

#[test]
fn test_expression_headers_round_trip() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("people.csv");
    fs::write(&source, "id,name\n1,Ann\n2,Bob\n").unwrap();

    let original = query_csv(
        "select id, name || '!', 'a;b' as semi, 'x\ty' as tab from people order by id",
        &[source],
    )
    .unwrap()
    .unwrap();
    assert_eq!(original.column_names[1], "name || '!'");

    let exported = dir.path().join("shout.csv");
    write_csv(&original, &exported, &CsvFormat::default()).unwrap();
    assert!(fs::read_to_string(&exported)
        .unwrap()
        .starts_with("id,\"name || '!'\",semi,tab\n"));

    let reloaded = query_csv("select * from shout", &[exported]).unwrap().unwrap();
    assert_eq!(reloaded.column_names, original.column_names);
    assert_eq!(reloaded.rows, original.rows);
}

#[test]
fn test_literal_quotes_round_trip() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("menu.csv");
    fs::write(&source, "size,name\n12\" pizza,a\n14\" pizza,b\n").unwrap();

    let original = query_csv("select * from menu", &[source]).unwrap().unwrap();
    assert_eq!(original.row_count(), 2);
    assert_eq!(original.rows[0][0], Value::Text("12\" pizza".to_string()));

    let exported = dir.path().join("menu_out.csv");
    write_csv(&original, &exported, &CsvFormat::default()).unwrap();
    let reloaded = query_csv("select * from menu_out", &[exported]).unwrap().unwrap();
    assert_eq!(reloaded.rows, original.rows);
}

#[test]
fn test_write_failure_leaves_no_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("missing_dir").join("out.csv");
    let result = ResultSet::new(vec!["a".to_string()], vec![vec![Value::Integer(1)]]);

    let err = write_csv(&result, &target, &CsvFormat::default()).unwrap_err();
    assert!(err.to_string().contains("out.csv"));
    assert!(!target.exists());
}
