use std::hint::black_box;

use collection_flow::collection::object_enrichment_plan;
use collection_flow::execution::{ExecutionEngine, ExecutionOptions};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

mod support;

fn bench_enrichment(c: &mut Criterion) {
    let terms = support::terminology();
    let sequential = ExecutionEngine::new(ExecutionOptions::sequential()).expect("engine");
    let parallel = ExecutionEngine::new(ExecutionOptions::default()).expect("engine");

    let mut group = c.benchmark_group("enrichment");
    for n in [1_000usize, 10_000, 100_000] {
        let objects = support::objects(n);
        let plan = object_enrichment_plan(&objects, &terms).expect("plan");
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("sequential", n), &plan, |b, plan| {
            b.iter(|| black_box(plan.materialize_with(&sequential).expect("materialize")))
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), &plan, |b, plan| {
            b.iter(|| black_box(plan.materialize_with(&parallel).expect("materialize")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enrichment);
criterion_main!(benches);
