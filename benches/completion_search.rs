use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fairshare_sim::dag::Dag;
use fairshare_sim::engine::Simulation;
use fairshare_sim::metrics::InMemoryMetricsSink;
use fairshare_sim::providers::StaticCatalog;
use fairshare_sim::resource::{ResourceKind, ResourceTable};
use fairshare_sim::time::SimTime;
use fairshare_sim::tool::ToolTemplate;

/// Builds a single request whose DAG is `width` independent root tools all
/// contending for the same resources, so every step of the run exercises
/// the completion search and progress accounting over the full active set.
fn build_wide_fan_out(width: usize) -> (ResourceTable, StaticCatalog) {
    let resources = ResourceTable::new([
        (ResourceKind::Cpu, 1_000.0),
        (ResourceKind::Npu, 64.0),
        (ResourceKind::Memory, 512.0),
        (ResourceKind::Network, 1_000.0),
        (ResourceKind::Disk, 1_000.0),
    ])
    .unwrap();

    let template = ToolTemplate::new(
        "worker",
        [(ResourceKind::Cpu, 50.0), (ResourceKind::Memory, 2.0)],
    )
    .unwrap();

    let nodes = (0..width).map(|i| (format!("n{i}"), "worker".to_string(), Vec::new()));
    let dag = Dag::new("fan_out", nodes).unwrap();

    let catalog = StaticCatalog::new().with_template("worker", template).with_dag("fan_out", dag);
    (resources, catalog)
}

fn bench_wide_active_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("completion_search_wide_active_set");
    for width in [8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                let (resources, catalog) = build_wide_fan_out(width);
                let mut sim: Simulation<StaticCatalog, StaticCatalog, InMemoryMetricsSink> =
                    Simulation::new(resources, catalog.clone(), catalog, InMemoryMetricsSink::new());
                sim.schedule_arrival("fan_out", SimTime::ZERO);
                let outcome = sim.run(SimTime::new(1_000_000.0)).unwrap();
                black_box(outcome);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wide_active_set);
criterion_main!(benches);
