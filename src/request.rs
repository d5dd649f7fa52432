//! Requests: a DAG's tool instances materialized for one arrival (spec §3).

use crate::ids::{RequestId, ToolId};
use crate::time::SimTime;
use crate::util::DetHashMap;

/// A DAG of tool instances materialized for one request arrival.
///
/// Owns its tool instances' ids (see [`crate::ids`] for why tools hold a
/// [`RequestId`] back-reference instead of the request owning them
/// directly in a cyclic structure).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Request {
    id: RequestId,
    request_type: String,
    arrival: SimTime,
    finish: Option<SimTime>,
    /// DAG node name -> materialized tool instance id.
    tools: DetHashMap<String, ToolId>,
}

impl Request {
    pub(crate) fn new(id: RequestId, request_type: String, arrival: SimTime) -> Self {
        Self {
            id,
            request_type,
            arrival,
            finish: None,
            tools: DetHashMap::default(),
        }
    }

    pub(crate) fn insert_tool(&mut self, node: String, tool: ToolId) {
        self.tools.insert(node, tool);
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    #[must_use]
    pub fn arrival_time(&self) -> SimTime {
        self.arrival
    }

    #[must_use]
    pub fn finish_time(&self) -> Option<SimTime> {
        self.finish
    }

    pub(crate) fn set_finish_time(&mut self, at: SimTime) {
        self.finish = Some(at);
    }

    /// Looks up the tool instance materialized for DAG node `name`.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<ToolId> {
        self.tools.get(name).copied()
    }

    /// All `(node name, tool id)` pairs for this request.
    pub fn tools(&self) -> impl Iterator<Item = (&str, ToolId)> {
        self.tools.iter().map(|(n, &t)| (n.as_str(), t))
    }

    /// Number of tool instances in this request's DAG.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Latency (finish - arrival), once the request has finished.
    #[must_use]
    pub fn latency(&self) -> Option<f64> {
        self.finish.map(|f| self.arrival.elapsed_until(f))
    }
}
