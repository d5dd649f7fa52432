//! Error taxonomy (spec §7).
//!
//! Configuration faults are raised synchronously at construction or
//! registration time and abort before a run starts. Invariant violations are
//! raised mid-run, are unrecoverable, and carry the offending entity and
//! timestamp so the diagnostic identifies exactly what went wrong — the
//! engine does not attempt recovery, since any such violation indicates a
//! programming defect rather than a simulated condition.

use thiserror::Error;

use crate::ids::{RequestId, ToolId};
use crate::resource::ResourceKind;
use crate::time::SimTime;

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration, detected before or at the start of a run.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A logic invariant was violated during a run.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Configuration faults (spec §7 "Configuration fault").
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("resource {resource} has non-positive capacity {capacity}")]
    NonPositiveCapacity { resource: ResourceKind, capacity: f64 },

    #[error("template {template:?} has negative load {load} on {resource}")]
    NegativeLoad {
        template: String,
        resource: ResourceKind,
        load: f64,
    },

    #[error("DAG for request type {request_type:?} contains a cycle")]
    CyclicDag { request_type: String },

    #[error("DAG node {node:?} references unknown tool template {template:?}")]
    MissingTemplate { node: String, template: String },

    #[error("DAG node {node:?} references unknown predecessor {predecessor:?}")]
    UnknownPredecessor { node: String, predecessor: String },

    #[error("request type {request_type:?} is not registered with the DAG provider")]
    UnknownRequestType { request_type: String },
}

/// Logic invariant violations (spec §7 "Logic invariant violation").
///
/// These are unrecoverable: the run aborts as soon as one is detected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("tool {tool:?} dispatched for start at {at} but was not pending")]
    ToolNotPending { tool: ToolId, at: SimTime },

    #[error("tool {tool:?} dispatched for start at {at} but predecessor {predecessor:?} is not completed")]
    PredecessorIncomplete {
        tool: ToolId,
        predecessor: ToolId,
        at: SimTime,
    },

    #[error(
        "progress accounting would drive tool {tool:?} resource {resource} below zero at {at}"
    )]
    NegativeRemaining {
        tool: ToolId,
        resource: ResourceKind,
        at: SimTime,
    },

    #[error("completion search found no candidate at {at} with a non-empty active set")]
    NoCompletionCandidate { at: SimTime },

    #[error("event timestamp {event_time} precedes current time {current_time}")]
    TimestampRegression {
        event_time: SimTime,
        current_time: SimTime,
    },

    #[error("request {request:?} referenced but not registered")]
    UnknownRequest { request: RequestId },

    #[error("tool {tool:?} referenced but not registered")]
    UnknownTool { tool: ToolId },

    #[error("request {request:?} has no DAG node named {node:?}, dispatched at {at}")]
    UnknownDagNode {
        request: RequestId,
        node: String,
        at: SimTime,
    },
}
