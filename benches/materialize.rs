use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use partscan_core::prelude::*;
use partscan_exec::materialize::RowMaterializer;
use partscan_exec::resolve::resolve_fields;
use partscan_exec::TableReader;
use partscan_io::input::MemoryRecordReader;
use partscan_io::MemoryFileSystem;
use partscan_serde::delimited::{DelimitedTextDeserializer, FIELD_DELIM};
use partscan_serde::Deserializer;

const ROWS: usize = 10_000;

fn lines() -> Vec<String> {
    (0..ROWS).map(|i| format!("item-{},{}", i % 64, i)).collect()
}

fn schema() -> Vec<Attribute> {
    vec![
        Attribute::new("name", DataType::Utf8),
        Attribute::new("value", DataType::Int32),
    ]
}

fn bench_materializer(c: &mut Criterion) {
    let lines = lines();
    let props: SerdeProperties = [
        ("columns", "name,value"),
        ("columns.types", "string:int"),
        (FIELD_DELIM, ","),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let columns: Vec<(Attribute, usize)> = schema().into_iter().zip(0..).collect();

    c.bench_function("materialize_delimited", |b| {
        b.iter(|| {
            let mut de = DelimitedTextDeserializer::new();
            de.initialize(&JobSettings::new(), &props).unwrap();
            let shape = de.shape().unwrap();
            let fields = resolve_fields(shape.as_ref(), &columns).unwrap();
            let mut m = RowMaterializer::new(
                Arc::from("bench"),
                Box::new(MemoryRecordReader::from_lines(lines.iter().map(String::as_str))),
                Box::new(de),
                shape,
                fields,
                Row::with_width(2),
            );
            let mut sum = 0i64;
            while m.advance().unwrap() {
                if let Some(Value::I32(v)) = m.row().get(1) {
                    sum += *v as i64;
                }
            }
            sum
        })
    });
}

fn bench_table_scan(c: &mut Criterion) {
    let fs = MemoryFileSystem::new();
    let body: String = lines().iter().map(|l| format!("{l}\n")).collect();
    fs.insert("/bench/part-0", body.as_str());
    fs.insert("/bench/part-1", body.as_str());
    let table = TableDescriptor::new("bench", "/bench", "text", "delimited")
        .with_property("columns", "name,value")
        .with_property("columns.types", "string:int")
        .with_property("field.delim", ",");
    let reader = TableReader::new(schema(), JobSettings::new())
        .unwrap()
        .with_file_system(Arc::new(fs));

    c.bench_function("scan_table_lending", |b| {
        b.iter(|| {
            let mut stream = reader.scan_table(&table).unwrap();
            let mut n = 0usize;
            while stream.next_row().unwrap().is_some() {
                n += 1;
            }
            n
        })
    });

    c.bench_function("scan_table_parallel", |b| {
        b.iter(|| reader.scan_table(&table).unwrap().collect_parallel().unwrap().len())
    });
}

criterion_group!(scans, bench_materializer, bench_table_scan);
criterion_main!(scans);
