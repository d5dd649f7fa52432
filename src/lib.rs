//! A discrete-event simulator for multi-agent DAG workloads sharing a fixed
//! pool of resources under dynamic max-min fair-share allocation.
//!
//! The engine never pre-schedules completions: the event queue
//! ([`event::EventQueue`]) holds only *start* events (request arrivals and
//! tool starts). At every step the engine compares the earliest queued start
//! event against a freshly recomputed completion instant (the earliest
//! moment some active tool would exhaust a resource at the current
//! fair-share rate) and advances to whichever is sooner. This keeps the
//! simulation's notion of "what happens next" always consistent with live
//! resource contention, at the cost of an O(active set) scan per step.
//!
//! Configuration (tool templates, DAG topology) and metrics aggregation are
//! deliberately kept outside the engine, behind the [`providers`] and
//! [`metrics`] traits — see [`engine::Simulation`] for the entry point.
//!
//! # Module Structure
//!
//! - [`engine`]: The simulation loop and its `Simulation` entry point
//! - [`scheduler`]: Completion search and fair-share progress accounting
//! - [`event`]: The start-event queue
//! - [`dag`]: DAG topology for request types
//! - [`tool`]: Tool templates and per-request tool instances
//! - [`request`]: Materialized requests
//! - [`resource`]: Resource kinds and capacity table
//! - [`providers`]: External template/DAG catalog traits
//! - [`metrics`]: Metrics sink trait and sample types
//! - [`snapshot`]: Serialized engine state for resume/replay
//! - [`error`]: Configuration and invariant-violation error types
//! - [`config`](mod@config): TOML configuration loading (requires the `config-file` feature)

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod dag;
pub mod engine;
pub mod error;
pub mod event;
pub mod ids;
pub mod metrics;
pub mod providers;
pub mod request;
pub mod resource;
pub mod scheduler;
pub mod snapshot;
pub mod time;
pub mod tool;
pub(crate) mod util;

#[cfg(feature = "config-file")]
pub mod config;

pub use engine::{RunOutcome, Simulation};
pub use error::{ConfigError, EngineError, InvariantViolation};
pub use ids::{RequestId, ToolId};
pub use resource::{ResourceKind, ResourceTable, TOLERANCE};
pub use time::SimTime;
