//! Benchmark – indexing a response once, then fetching single rows by path
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jsonseek::{CodecOptions, Encoder, Path, Source, Value, accessor};

/// A deterministic `{"Status":200,"Rows":[...]}` document with `rows` rows.
fn make_response(rows: usize) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    enc.start_object().unwrap();
    enc.add_keyed_scalar("Status", 200).unwrap();
    enc.start_keyed_array("Rows").unwrap();
    for i in 0..rows {
        enc.start_object().unwrap();
        enc.add_keyed_scalar("id", i64::try_from(i).unwrap()).unwrap();
        enc.add_keyed_scalar("name", format!("row \"{i}\"\tname")).unwrap();
        enc.start_keyed_array("values").unwrap();
        for v in 0..8 {
            enc.add_scalar(v).unwrap();
        }
        enc.end_array().unwrap();
        enc.end_object().unwrap();
    }
    enc.finish().unwrap()
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");
    for &rows in &[100usize, 10_000] {
        let payload = make_response(rows);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &payload, |b, payload| {
            b.iter(|| {
                let mut source = Source::from_bytes(payload.clone());
                let index = accessor::build_index(&mut source, &CodecOptions::default()).unwrap();
                black_box(index.len());
            });
        });
    }
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let rows = 10_000;
    let options = CodecOptions::default();
    let mut source = Source::from_bytes(make_response(rows));
    let index = accessor::build_index(&mut source, &options).unwrap();
    let last_row = Path::parse(&format!("Rows:{}", rows - 1));
    let last_value = Path::parse(&format!("Rows:{}:values:7", rows - 1));

    let mut group = c.benchmark_group("get");
    group.bench_function("indexed_row", |b| {
        b.iter(|| {
            let v: Value = accessor::get(&mut source, &index, black_box(&last_row), &options).unwrap();
            black_box(v);
        });
    });
    group.bench_function("indexed_array_element", |b| {
        b.iter(|| {
            let v = accessor::get(&mut source, &index, black_box(&last_value), &options).unwrap();
            black_box(v);
        });
    });
    group.bench_function("whole_document", |b| {
        b.iter(|| {
            let v = accessor::get(&mut source, &index, &Path::root(), &options).unwrap();
            black_box(v);
        });
    });
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(10));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_build_index, bench_get }
criterion_main!(benches);
