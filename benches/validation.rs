use std::hint::black_box;

use collection_flow::collection::{object_enrichment_plan, object_schema};
use collection_flow::validation::{ValidationEngine, ValidationOptions};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

mod support;

// Full schema vs. the dtype-only and flat-columns-only views.
fn bench_validation(c: &mut Criterion) {
    let terms = support::terminology();
    let engine = ValidationEngine::new(ValidationOptions::default()).expect("engine");
    let full = object_schema().expect("schema");
    let dtype_only = full.dtype_only();
    let flat = full.with_checks_only(&["object_id", "title", "date_made", "credit_line", "department"]);

    let mut group = c.benchmark_group("validation");
    for n in [1_000usize, 10_000, 100_000] {
        let table = object_enrichment_plan(&support::objects(n), &terms)
            .and_then(|plan| plan.materialize())
            .expect("enriched table");
        group.throughput(Throughput::Elements(n as u64));
        for (name, schema) in [("full", &full), ("dtype_only", &dtype_only), ("flat_checks", &flat)] {
            group.bench_with_input(BenchmarkId::new(name, n), &table, |b, table| {
                b.iter(|| black_box(engine.validate(table, schema)))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_validation);
criterion_main!(benches);
