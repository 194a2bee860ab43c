//! Hot-path benchmarks, mirroring the teacher's `benches/benchmarks.rs`
//! criterion configuration: node pool allocation and equivalence-class
//! rebuild, the two paths spec.md §4.1/§4.4 call out as performance
//! sensitive.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use thts::thts::equivalence::EquivalenceClasses;
use thts::thts::pool::NodePool;

fn bench_node_pool_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_pool_allocation");
    for size in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut pool = NodePool::new(size + 10);
                pool.create_root_node(20);
                for _ in 0..size {
                    pool.create_decision_node(1.0, 0.0, 10);
                }
            });
        });
    }
    group.finish();
}

fn bench_equivalence_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("equivalence_rebuild");
    for size in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut pool = NodePool::new(size * 2 + 10);
                    let root = pool.create_root_node(3);
                    let mut chances = Vec::with_capacity(size);
                    for _ in 0..size {
                        let chance = pool.create_chance_node(1.0, 2, true);
                        let leaf = pool.create_decision_node(1.0, 1.0, 1);
                        pool.get_mut(chance).children = vec![Some(leaf)];
                        chances.push(Some(chance));
                    }
                    pool.get_mut(root).children = chances;
                    pool
                },
                |mut pool| {
                    let mut classes = EquivalenceClasses::new();
                    classes.rebuild(&mut pool);
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10);
    targets = bench_node_pool_allocation, bench_equivalence_rebuild
}
criterion_main!(benches);
