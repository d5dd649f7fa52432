//! Stable identifiers for tool instances and requests (spec §3, §9).
//!
//! Tool instances hold a [`RequestId`] rather than an owning reference back
//! to their request, resolved by lookup through the engine's request
//! registry — this is how the crate avoids the request↔tool ownership
//! cycle spec §9 calls out. Both ids wrap a `slab` key; neither is ever
//! reused within a single run; a request or tool is only ever removed from
//! its registry when the whole run is torn down.

use std::fmt;

/// Identifies a tool instance, unique within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ToolId(pub(crate) usize);

impl ToolId {
    #[must_use]
    pub(crate) const fn from_slab_key(key: usize) -> Self {
        Self(key)
    }

    #[must_use]
    pub(crate) const fn slab_key(self) -> usize {
        self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tool#{}", self.0)
    }
}

/// Identifies a request, unique within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RequestId(pub(crate) usize);

impl RequestId {
    #[must_use]
    pub(crate) const fn from_slab_key(key: usize) -> Self {
        Self(key)
    }

    #[must_use]
    pub(crate) const fn slab_key(self) -> usize {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}
