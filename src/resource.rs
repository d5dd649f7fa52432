//! Resource kinds and the fixed capacity table (spec §3, §4.2).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Numerical tolerance below which remaining work is treated as zero
/// (spec §4.4 "Numerical policy").
pub const TOLERANCE: f64 = 1e-9;

/// The closed set of resource kinds the engine understands.
///
/// This set is fixed for the life of a run; new kinds are not discovered
/// dynamically (spec §3 "Resource kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Cpu,
    Npu,
    Memory,
    Network,
    Disk,
}

impl ResourceKind {
    /// All resource kinds, in a fixed deterministic order. Used as the
    /// iteration order for per-resource vectors and tie-breaking (spec §4.3:
    /// "by tool identity then resource kind ordinal").
    pub const ALL: [Self; 5] = [
        Self::Cpu,
        Self::Npu,
        Self::Memory,
        Self::Network,
        Self::Disk,
    ];

    /// This kind's position in [`Self::ALL`], used as the resource-kind
    /// ordinal for deterministic tie-breaking.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Npu => 1,
            Self::Memory => 2,
            Self::Network => 3,
            Self::Disk => 4,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Npu => "npu",
            Self::Memory => "memory",
            Self::Network => "network",
            Self::Disk => "disk",
        };
        f.write_str(name)
    }
}

/// A fixed mapping from resource kind to total capacity.
///
/// Capacities are configuration-time constants: once a [`ResourceTable`] is
/// constructed it cannot be mutated, matching spec §3's "configuration-time
/// constants for the life of a run".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceTable {
    capacities: [f64; ResourceKind::ALL.len()],
}

impl ResourceTable {
    /// Builds a resource table, validating every capacity is strictly
    /// positive (spec §7 configuration fault: "non-positive resource
    /// capacity").
    pub fn new(capacities: impl IntoIterator<Item = (ResourceKind, f64)>) -> Result<Self, ConfigError> {
        let mut table = [0.0_f64; ResourceKind::ALL.len()];
        let mut seen = [false; ResourceKind::ALL.len()];
        for (kind, capacity) in capacities {
            if capacity <= 0.0 {
                return Err(ConfigError::NonPositiveCapacity { resource: kind, capacity });
            }
            table[kind.ordinal()] = capacity;
            seen[kind.ordinal()] = true;
        }
        for kind in ResourceKind::ALL {
            if !seen[kind.ordinal()] {
                return Err(ConfigError::NonPositiveCapacity { resource: kind, capacity: 0.0 });
            }
        }
        Ok(Self { capacities: table })
    }

    /// Returns the capacity of `kind`.
    #[must_use]
    pub fn capacity(&self, kind: ResourceKind) -> f64 {
        self.capacities[kind.ordinal()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_capacity() {
        let err = ResourceTable::new([
            (ResourceKind::Cpu, 0.0),
            (ResourceKind::Npu, 1.0),
            (ResourceKind::Memory, 1.0),
            (ResourceKind::Network, 1.0),
            (ResourceKind::Disk, 1.0),
        ]);
        assert!(matches!(err, Err(ConfigError::NonPositiveCapacity { .. })));
    }

    #[test]
    fn rejects_missing_kind() {
        let err = ResourceTable::new([(ResourceKind::Cpu, 100.0)]);
        assert!(err.is_err());
    }

    #[test]
    fn accepts_full_table() {
        let table = ResourceTable::new([
            (ResourceKind::Cpu, 100.0),
            (ResourceKind::Npu, 4.0),
            (ResourceKind::Memory, 64.0),
            (ResourceKind::Network, 100.0),
            (ResourceKind::Disk, 100.0),
        ])
        .unwrap();
        assert_eq!(table.capacity(ResourceKind::Cpu), 100.0);
        assert_eq!(table.capacity(ResourceKind::Disk), 100.0);
    }
}
