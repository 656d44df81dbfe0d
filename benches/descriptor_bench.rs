//! Benchmarks for set-request decoding.
//!
//! Every set request goes through `decode_set_payload`, so its cost bounds how
//! fast a node can absorb a large reconfiguration batch.
//!
//! ```sh
//! cargo bench --bench descriptor_bench
//! cargo bench --bench descriptor_bench -- batch
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sensorlink_core::{PeripheralDescriptor, decode_set_payload};
use serde_json::{Value, json};
use std::hint::black_box;

fn descriptor(id: usize) -> Value {
    json!({
        "id": id,
        "tipo": 6,
        "desc": format!("joystick {id}"),
        "atributo1": 0,
        "pinos": [
            {"pino": 34, "tipo": 3},
            {"pino": 35, "tipo": 3},
            {"pino": 32, "tipo": 1}
        ]
    })
}

fn bench_single_descriptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("single");
    group.throughput(Throughput::Elements(1));

    let payload = descriptor(1).to_string();
    group.bench_function("payload", |b| {
        b.iter(|| black_box(decode_set_payload(black_box(payload.as_bytes()))))
    });

    let value = descriptor(1);
    group.bench_function("value", |b| {
        b.iter(|| black_box(PeripheralDescriptor::from_value(black_box(&value))))
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");

    for size in [1usize, 8, 32] {
        group.throughput(Throughput::Elements(size as u64));
        let payload = json!({"sensors": (0..size).map(descriptor).collect::<Vec<_>>()}).to_string();

        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| black_box(decode_set_payload(black_box(payload.as_bytes()))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_descriptor, bench_batch);
criterion_main!(benches);
