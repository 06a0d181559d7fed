//! Criterion measurements for statement scanning and per-call binding.
//!
//! `scan` covers the one-time cost paid by `prepare`; `bind` the per-call cost of resolving a
//! named mapping against an already scanned statement.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_bridge::prelude::*;
use sql_bridge::Binder;

/// An INSERT with `width` named columns plus a matching mapping.
fn insert_template(width: usize) -> (String, Params) {
    let columns: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
    let tokens: Vec<String> = columns.iter().map(|c| format!("${c}")).collect();
    let sql = format!(
        "INSERT INTO wide ({}) VALUES ({}) -- trailing $comment",
        columns.join(", "),
        tokens.join(", ")
    );
    let params = Params::named(
        columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), RowValues::Int(i64::try_from(i).unwrap_or(0)))),
    );
    (sql, params)
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    for width in [4usize, 32, 256] {
        let (sql, _) = insert_template(width);
        group.throughput(Throughput::Bytes(sql.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &sql, |b, sql| {
            b.iter(|| Binder::new(black_box(sql), PlaceholderStyle::Sqlite));
        });
    }
    group.finish();
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    for width in [4usize, 32, 256] {
        let (sql, params) = insert_template(width);
        let binder = Binder::new(&sql, PlaceholderStyle::Postgres);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &params, |b, params| {
            b.iter(|| binder.bind(black_box(params.clone())));
        });
    }
    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let script: String = (0..200)
        .map(|i| format!("CREATE TABLE t{i}(id INT, note TEXT DEFAULT 'a;\nb');\n"))
        .collect();
    c.bench_function("split_statements/200", |b| {
        b.iter(|| split_statements(black_box(&script)));
    });
}

criterion_group!(benches, bench_scan, bench_bind, bench_split);
criterion_main!(benches);
