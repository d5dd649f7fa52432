//! Tool templates and tool instances (spec §3 "Tool template", "Tool instance").

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ids::{RequestId, ToolId};
use crate::resource::{ResourceKind, TOLERANCE};
use crate::time::SimTime;

/// Per-resource work amounts a tool of this kind must complete.
///
/// A zero load means the tool never touches that resource at all (spec §3:
/// "Zero means the tool does not use that resource").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolTemplate {
    loads: [f64; ResourceKind::ALL.len()],
}

impl ToolTemplate {
    /// Builds a template, validating every load is non-negative (spec §7:
    /// "negative load").
    pub fn new(
        name: &str,
        loads: impl IntoIterator<Item = (ResourceKind, f64)>,
    ) -> Result<Self, ConfigError> {
        let mut table = [0.0_f64; ResourceKind::ALL.len()];
        for (kind, load) in loads {
            if load < 0.0 {
                return Err(ConfigError::NegativeLoad {
                    template: name.to_string(),
                    resource: kind,
                    load,
                });
            }
            table[kind.ordinal()] = load;
        }
        Ok(Self { loads: table })
    }

    /// Returns the load on `kind`.
    #[must_use]
    pub fn load(&self, kind: ResourceKind) -> f64 {
        self.loads[kind.ordinal()]
    }

    /// True if every resource load is zero — such a tool starts and
    /// completes at the same instant (spec §8 "Zero-load tool"; spec §9
    /// leaves whether such tools *should* exist to the external loader, but
    /// the engine must handle them correctly if they do).
    #[must_use]
    pub fn is_zero_load(&self) -> bool {
        self.loads.iter().all(|&l| l <= TOLERANCE)
    }
}

/// Lifecycle state of a tool instance (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
}

/// One DAG node materialized for one specific request.
///
/// Invariants (spec §3):
/// - While `Pending`, `remaining` equals the template's loads and
///   `start`/`finish` are `None`.
/// - While `Running`, `remaining` is monotonically non-increasing and at
///   least one resource has `remaining > TOLERANCE`.
/// - On transition to `Completed`, every resource's remaining work is
///   within [`TOLERANCE`] of zero and `finish` is set to the current time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInstance {
    pub(crate) id: ToolId,
    pub(crate) request: RequestId,
    pub(crate) node: String,
    pub(crate) template_name: String,
    pub(crate) status: ToolStatus,
    pub(crate) start: Option<SimTime>,
    pub(crate) finish: Option<SimTime>,
    pub(crate) remaining: [f64; ResourceKind::ALL.len()],
}

impl ToolInstance {
    pub(crate) fn new_pending(
        id: ToolId,
        request: RequestId,
        node: String,
        template_name: String,
        template: &ToolTemplate,
    ) -> Self {
        Self {
            id,
            request,
            node,
            template_name,
            status: ToolStatus::Pending,
            start: None,
            finish: None,
            remaining: template.loads,
        }
    }

    #[must_use]
    pub fn id(&self) -> ToolId {
        self.id
    }

    #[must_use]
    pub fn request(&self) -> RequestId {
        self.request
    }

    /// The DAG node name this instance materializes.
    #[must_use]
    pub fn node(&self) -> &str {
        &self.node
    }

    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    #[must_use]
    pub fn status(&self) -> ToolStatus {
        self.status
    }

    #[must_use]
    pub fn start_time(&self) -> Option<SimTime> {
        self.start
    }

    #[must_use]
    pub fn finish_time(&self) -> Option<SimTime> {
        self.finish
    }

    #[must_use]
    pub fn remaining(&self, kind: ResourceKind) -> f64 {
        self.remaining[kind.ordinal()]
    }

    /// True if every resource's remaining work is within tolerance of zero.
    #[must_use]
    pub(crate) fn is_fully_exhausted(&self) -> bool {
        self.remaining.iter().all(|&r| r <= TOLERANCE)
    }

    pub(crate) fn transition_to_running(&mut self, at: SimTime) {
        self.status = ToolStatus::Running;
        self.start = Some(at);
    }

    pub(crate) fn transition_to_completed(&mut self, at: SimTime) {
        for r in &mut self.remaining {
            *r = 0.0;
        }
        self.status = ToolStatus::Completed;
        self.finish = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_load() {
        let err = ToolTemplate::new("t", [(ResourceKind::Cpu, -1.0)]);
        assert!(matches!(err, Err(ConfigError::NegativeLoad { .. })));
    }

    #[test]
    fn zero_load_template_is_detected() {
        let t = ToolTemplate::new("t", []).unwrap();
        assert!(t.is_zero_load());
        let t = ToolTemplate::new("t", [(ResourceKind::Cpu, 1.0)]).unwrap();
        assert!(!t.is_zero_load());
    }

    #[test]
    fn new_pending_copies_template_loads() {
        let template = ToolTemplate::new("t", [(ResourceKind::Cpu, 50.0)]).unwrap();
        let inst = ToolInstance::new_pending(
            ToolId::from_slab_key(0),
            RequestId::from_slab_key(0),
            "n".into(),
            "t".into(),
            &template,
        );
        assert_eq!(inst.remaining(ResourceKind::Cpu), 50.0);
        assert_eq!(inst.status(), ToolStatus::Pending);
        assert!(inst.start_time().is_none());
    }
}
