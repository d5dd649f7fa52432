//! Metrics collaborator (spec §6 "Outputs produced").
//!
//! Percentile estimation and aggregation are out of scope for the engine
//! (spec §1); the engine only ever hands raw samples to a [`MetricsSink`].
//! `InMemoryMetricsSink` is a minimal implementation for tests and simple
//! embedders; a production caller would forward these into a real
//! aggregator the way asupersync's `observability` module forwards into
//! counters and histograms.

use serde::Serialize;

use crate::ids::RequestId;
use crate::resource::ResourceKind;
use crate::time::SimTime;

/// One completed request (spec §6: "Per-completed-request").
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySample {
    pub request: RequestId,
    pub arrival: SimTime,
    pub finish: SimTime,
    pub latency: f64,
}

/// An optional per-step utilization snapshot (spec §6: "Per-step (optional
/// snapshot hook)").
///
/// Utilization is `1.0` when at least one active consumer exists on that
/// resource, `0.0` otherwise — fair-share always allocates all capacity
/// when a consumer is present, so this binary formulation is exact for this
/// design (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UtilizationSnapshot {
    pub at: SimTime,
    pub active_tool_count: usize,
    pub utilization: [f64; ResourceKind::ALL.len()],
}

/// Receives engine outputs. The engine never aggregates, logs to a side
/// channel, or computes percentiles on its own — that is this
/// collaborator's job (spec §1, §6).
pub trait MetricsSink {
    fn record_completion(&mut self, sample: LatencySample);

    /// Called at most once per step, only if the engine is configured to
    /// snapshot (spec §9: "Whether utilization snapshots should be taken on
    /// every step or only at sampled instants is left to the metrics
    /// collaborator").
    fn record_snapshot(&mut self, _snapshot: UtilizationSnapshot) {}
}

/// A `MetricsSink` that just accumulates everything in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsSink {
    pub completions: Vec<LatencySample>,
    pub snapshots: Vec<UtilizationSnapshot>,
}

impl InMemoryMetricsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn latency_for(&self, request: RequestId) -> Option<f64> {
        self.completions.iter().find(|s| s.request == request).map(|s| s.latency)
    }

    /// Renders the accumulated completion samples as a JSON array, for
    /// handing off to external dashboards that don't speak MessagePack.
    pub fn completions_to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.completions)
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn record_completion(&mut self, sample: LatencySample) {
        self.completions.push(sample);
    }

    fn record_snapshot(&mut self, snapshot: UtilizationSnapshot) {
        self.snapshots.push(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;

    #[test]
    fn latency_for_finds_matching_request() {
        let mut sink = InMemoryMetricsSink::new();
        sink.record_completion(LatencySample {
            request: RequestId::from_slab_key(0),
            arrival: SimTime::ZERO,
            finish: SimTime::new(2.0),
            latency: 2.0,
        });
        assert_eq!(sink.latency_for(RequestId::from_slab_key(0)), Some(2.0));
        assert_eq!(sink.latency_for(RequestId::from_slab_key(1)), None);
    }

    #[test]
    fn completions_serialize_to_json() {
        let mut sink = InMemoryMetricsSink::new();
        sink.record_completion(LatencySample {
            request: RequestId::from_slab_key(3),
            arrival: SimTime::ZERO,
            finish: SimTime::new(1.5),
            latency: 1.5,
        });
        let json = sink.completions_to_json().unwrap();
        assert!(json.contains("\"latency\":1.5"));
    }
}
