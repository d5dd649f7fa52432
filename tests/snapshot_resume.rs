//! Snapshot/resume: splitting a run in two via a serialized snapshot must
//! produce the same final metrics as running straight through (spec §9).

use fairshare_sim::dag::Dag;
use fairshare_sim::engine::{RunOutcome, Simulation};
use fairshare_sim::metrics::InMemoryMetricsSink;
use fairshare_sim::providers::StaticCatalog;
use fairshare_sim::resource::{ResourceKind, ResourceTable};
use fairshare_sim::snapshot::EngineSnapshot;
use fairshare_sim::time::SimTime;
use fairshare_sim::tool::ToolTemplate;
use pretty_assertions::assert_eq;

fn catalog_and_resources() -> (ResourceTable, StaticCatalog) {
    let resources = ResourceTable::new([
        (ResourceKind::Cpu, 100.0),
        (ResourceKind::Npu, 1.0),
        (ResourceKind::Memory, 1.0),
        (ResourceKind::Network, 1.0),
        (ResourceKind::Disk, 1.0),
    ])
    .unwrap();
    let a = ToolTemplate::new("a", [(ResourceKind::Cpu, 100.0)]).unwrap();
    let b = ToolTemplate::new("b", [(ResourceKind::Cpu, 60.0)]).unwrap();
    let dag = Dag::new(
        "chain",
        [
            ("a".to_string(), "a".to_string(), vec![]),
            ("b".to_string(), "b".to_string(), vec!["a".to_string()]),
        ],
    )
    .unwrap();
    let catalog = StaticCatalog::new().with_template("a", a).with_template("b", b).with_dag("chain", dag);
    (resources, catalog)
}

#[test]
fn split_run_matches_straight_through_run() {
    let (resources, catalog) = catalog_and_resources();
    let mut straight: Simulation<StaticCatalog, StaticCatalog, InMemoryMetricsSink> =
        Simulation::new(resources, catalog.clone(), catalog.clone(), InMemoryMetricsSink::new());
    straight.schedule_arrival("chain", SimTime::ZERO);
    straight.schedule_arrival("chain", SimTime::new(0.3));
    let outcome = straight.run(SimTime::new(1_000.0)).unwrap();
    assert_eq!(outcome, RunOutcome::Exhausted);
    let mut expected: Vec<f64> = straight.metrics().completions.iter().map(|s| s.latency).collect();
    expected.sort_by(|x, y| x.total_cmp(y));

    let (resources, catalog) = catalog_and_resources();
    let mut split: Simulation<StaticCatalog, StaticCatalog, InMemoryMetricsSink> =
        Simulation::new(resources, catalog.clone(), catalog.clone(), InMemoryMetricsSink::new());
    split.schedule_arrival("chain", SimTime::ZERO);
    split.schedule_arrival("chain", SimTime::new(0.3));
    // Stop partway through, round-trip through bytes, and resume with a
    // freshly constructed set of collaborators.
    let midpoint_outcome = split.run(SimTime::new(0.2)).unwrap();
    assert_eq!(midpoint_outcome, RunOutcome::DeadlineReached);

    let bytes = split.snapshot().to_bytes().unwrap();
    let restored_snapshot = EngineSnapshot::from_bytes(&bytes).unwrap();
    let (_, catalog) = catalog_and_resources();
    let mut resumed: Simulation<StaticCatalog, StaticCatalog, InMemoryMetricsSink> =
        Simulation::restore(restored_snapshot, catalog.clone(), catalog, InMemoryMetricsSink::new());
    let outcome = resumed.run(SimTime::new(1_000.0)).unwrap();
    assert_eq!(outcome, RunOutcome::Exhausted);

    let mut actual: Vec<f64> = resumed.metrics().completions.iter().map(|s| s.latency).collect();
    actual.sort_by(|x, y| x.total_cmp(y));

    assert_eq!(expected.len(), actual.len());
    for (e, a) in expected.iter().zip(actual.iter()) {
        assert!((e - a).abs() < 1e-9, "expected {e}, got {a}");
    }
}
