//! Serialized engine state for deterministic resume (spec §9: "snapshot and
//! resume" left open; decided in `DESIGN.md` to support it via `rmp-serde`).
//!
//! A snapshot captures everything [`crate::engine::Simulation::run`] reads or
//! mutates: current time, resource capacities, every tool and request (via
//! their slab storage), the active set, and the pending event queue. It
//! deliberately does *not* capture the `templates`/`dags`/`metrics`
//! collaborators — those are supplied fresh by the caller on restore, the
//! same way they are supplied fresh on construction, since they are
//! configuration rather than run state.

use serde::{Deserialize, Serialize};
use slab::Slab;

use crate::engine::Simulation;
use crate::event::EventQueue;
use crate::ids::ToolId;
use crate::metrics::MetricsSink;
use crate::providers::{DagProvider, TemplateProvider};
use crate::request::Request;
use crate::resource::ResourceTable;
use crate::time::SimTime;
use crate::tool::ToolInstance;
use crate::util::DetHashSet;

/// A point-in-time capture of everything needed to resume a run, modulo the
/// external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    current_time: SimTime,
    resources: ResourceTable,
    tools: Slab<ToolInstance>,
    requests: Slab<Request>,
    active: Vec<ToolId>,
    queue: EventQueue,
}

/// Failures encountered while encoding or decoding a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl EngineSnapshot {
    /// Encodes this snapshot as MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Decodes a snapshot previously produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

impl<T, D, M> Simulation<T, D, M>
where
    T: TemplateProvider,
    D: DagProvider,
    M: MetricsSink,
{
    /// Captures the current run state. The returned snapshot is
    /// self-contained and independent of `self` once created.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            current_time: self.current_time,
            resources: self.resources,
            tools: self.tools.clone(),
            requests: self.requests.clone(),
            active: self.active.iter().copied().collect(),
            queue: self.queue.clone(),
        }
    }

    /// Rebuilds a `Simulation` from a snapshot, reattaching fresh
    /// collaborators. The resulting engine resumes exactly where the
    /// snapshot was taken: the next call to `run` dispatches the same next
    /// event and accounts progress from the same remaining-work state.
    #[must_use]
    pub fn restore(snapshot: EngineSnapshot, templates: T, dags: D, metrics: M) -> Self {
        let mut active: DetHashSet<ToolId> = DetHashSet::default();
        active.extend(snapshot.active);
        Self::from_parts(
            snapshot.current_time,
            snapshot.queue,
            snapshot.resources,
            snapshot.tools,
            snapshot.requests,
            active,
            templates,
            dags,
            metrics,
        )
    }
}
