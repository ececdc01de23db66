//! Values written in each record format read back unchanged through resolved
//! field handles, for every primitive type.

use partscan_core::cast::{format_date, parse_date};
use partscan_core::config::JobSettings;
use partscan_core::descriptor::SerdeProperties;
use partscan_core::schema::DataType;
use partscan_core::types::{NativeRecord, RawRecord, Row, Value};
use partscan_io::writers::JsonlRowWriter;
use partscan_serde::csv::CsvDeserializer;
use partscan_serde::delimited::DelimitedTextDeserializer;
use partscan_serde::json::JsonDeserializer;
use partscan_serde::shape::{COLUMNS, COLUMN_TYPES};
use partscan_serde::{Deserializer, FieldHandle};

const NAMES: [&str; 8] = ["flag", "small", "big", "ratio", "score", "label", "blob", "day"];
const TYPES: &str = "boolean:int:bigint:float:double:string:binary:date";
const DECLARED: [DataType; 8] = [
    DataType::Boolean,
    DataType::Int32,
    DataType::Int64,
    DataType::Float32,
    DataType::Float64,
    DataType::Utf8,
    DataType::Binary,
    DataType::Date32,
];

fn properties() -> SerdeProperties {
    let mut props = SerdeProperties::new();
    props.insert(COLUMNS.to_string(), NAMES.join(","));
    props.insert(COLUMN_TYPES.to_string(), TYPES.to_string());
    props
}

fn sample_rows() -> Vec<Vec<Value>> {
    vec![
        vec![
            Value::Bool(true),
            Value::I32(-7),
            Value::I64(9_000_000_000),
            Value::F32(1.5),
            Value::F64(-2.5),
            Value::Str("héllo, \"world\"".into()),
            Value::Bin(b"raw bytes".to_vec()),
            Value::Date(parse_date("2000-03-01").unwrap()),
        ],
        vec![
            Value::Bool(false),
            Value::I32(i32::MAX),
            Value::I64(i64::MIN),
            Value::F32(0.1),
            Value::F64(1234.125),
            Value::Str(String::new()),
            Value::Bin(b"x".to_vec()),
            Value::Date(-1),
        ],
    ]
}

fn null_row() -> Vec<Value> {
    vec![Value::Null; NAMES.len()]
}

fn text(v: &Value) -> String {
    match v {
        Value::Null => "\\N".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::I32(i) => i.to_string(),
        Value::I64(i) => i.to_string(),
        Value::F32(f) => f.to_string(),
        Value::F64(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::Bin(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Date(d) => format_date(*d),
    }
}

/// Decode `lines` and read every field back through its resolved handle.
fn read_back(de: &mut dyn Deserializer, lines: &[String]) -> Vec<Vec<Value>> {
    de.initialize(&JobSettings::new(), &properties()).unwrap();
    let shape = de.shape().unwrap();
    let handles: Vec<FieldHandle> = NAMES
        .iter()
        .map(|n| shape.resolve_field(n).unwrap())
        .collect();
    for (h, dt) in handles.iter().zip(DECLARED) {
        assert_eq!(shape.field_type(*h), dt);
    }

    let mut native = NativeRecord::default();
    lines
        .iter()
        .map(|line| {
            de.deserialize_into(&RawRecord::from(line.as_str()), &mut native)
                .unwrap();
            handles
                .iter()
                .map(|h| shape.extract(&native, *h).clone())
                .collect()
        })
        .collect()
}

#[test]
fn test_json_lines_round_trip_every_type() {
    let mut expected = sample_rows();
    expected.push(null_row());

    let mut writer = JsonlRowWriter::to_writer(
        Vec::new(),
        NAMES.iter().map(|n| n.to_string()).collect(),
    );
    for values in &expected {
        writer.write_row(&Row::from_values(values.clone())).unwrap();
    }
    let out = String::from_utf8(writer.finish().unwrap()).unwrap();
    let lines: Vec<String> = out.lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(read_back(&mut JsonDeserializer::new(), &lines), expected);
}

#[test]
fn test_delimited_round_trip_every_type() {
    let mut expected = sample_rows();
    expected.push(null_row());

    let lines: Vec<String> = expected
        .iter()
        .map(|values| {
            values
                .iter()
                .map(text)
                .collect::<Vec<_>>()
                .join("\u{1}")
        })
        .collect();

    assert_eq!(
        read_back(&mut DelimitedTextDeserializer::new(), &lines),
        expected
    );
}

#[test]
fn test_quoted_csv_round_trip_every_type() {
    let expected = sample_rows();
    let lines: Vec<String> = expected
        .iter()
        .map(|values| {
            values
                .iter()
                .map(|v| format!("\"{}\"", text(v).replace('"', "\"\"")))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();

    assert_eq!(read_back(&mut CsvDeserializer::new(), &lines), expected);
}

#[test]
fn test_resolving_twice_extracts_the_same_values() {
    let mut de = DelimitedTextDeserializer::new();
    de.initialize(&JobSettings::new(), &properties()).unwrap();
    let shape = de.shape().unwrap();
    let mut native = NativeRecord::default();
    let line: Vec<String> = sample_rows()[0].iter().map(text).collect();
    de.deserialize_into(&RawRecord::from(line.join("\u{1}").as_str()), &mut native)
        .unwrap();

    for name in NAMES {
        let first = shape.resolve_field(name).unwrap();
        let second = shape.resolve_field(&name.to_uppercase()).unwrap();
        assert_eq!(shape.extract(&native, first), shape.extract(&native, second));
    }
}
