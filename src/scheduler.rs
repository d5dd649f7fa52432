//! The fair-share model: completion search and progress accounting
//! (spec §4.2, §4.3, §4.4).
//!
//! Both functions are pure with respect to the active set: the denominator
//! `|A_r|` for each resource is fixed by the active set as it stood when the
//! interval began, since the engine always advances time to the next change
//! point before mutating membership.

use slab::Slab;

use crate::error::InvariantViolation;
use crate::ids::ToolId;
use crate::resource::{ResourceKind, ResourceTable, TOLERANCE};
use crate::time::SimTime;
use crate::tool::ToolInstance;
use crate::util::DetHashSet;

/// Per-resource count of active tools with positive remaining work on that
/// resource — the fair-share denominator `|A_r|` (spec §4.2).
pub type ActiveCounts = [usize; ResourceKind::ALL.len()];

/// Computes `|A_r|` for every resource kind over the current active set.
#[must_use]
pub fn count_active_per_resource(tools: &Slab<ToolInstance>, active: &DetHashSet<ToolId>) -> ActiveCounts {
    let mut counts: ActiveCounts = [0; ResourceKind::ALL.len()];
    for &tool_id in active {
        let Some(tool) = tools.get(tool_id.slab_key()) else { continue };
        for kind in ResourceKind::ALL {
            if tool.remaining(kind) > TOLERANCE {
                counts[kind.ordinal()] += 1;
            }
        }
    }
    counts
}

/// Finds the globally earliest upcoming resource-exhaustion instant across
/// every active tool (spec §4.3).
///
/// Returns `None` when the active set is empty or contains no tool with any
/// positive remaining work — the completion search's `+∞` (spec §4.3: "If
/// the active set is empty the search returns +∞").
#[must_use]
pub fn find_next_completion(
    current_time: SimTime,
    tools: &Slab<ToolInstance>,
    active: &DetHashSet<ToolId>,
    resources: &ResourceTable,
) -> Option<(ToolId, ResourceKind, SimTime)> {
    let counts = count_active_per_resource(tools, active);
    let mut best: Option<(ToolId, ResourceKind, SimTime)> = None;

    let mut candidates: Vec<ToolId> = active.iter().copied().collect();
    candidates.sort_unstable();

    for tool_id in candidates {
        let Some(tool) = tools.get(tool_id.slab_key()) else { continue };
        for kind in ResourceKind::ALL {
            let remaining = tool.remaining(kind);
            if remaining <= TOLERANCE {
                continue;
            }
            let denom = counts[kind.ordinal()];
            if denom == 0 {
                continue;
            }
            let rate = resources.capacity(kind) / denom as f64;
            let finish_at = current_time + remaining / rate;
            let candidate = (tool_id, kind, finish_at);
            best = Some(match best {
                None => candidate,
                Some(current_best) => {
                    if is_earlier(&candidate, &current_best) {
                        candidate
                    } else {
                        current_best
                    }
                }
            });
        }
    }

    best
}

/// Tie-break ordering for the completion search: earliest time wins; ties
/// broken by tool identity then resource kind ordinal (spec §4.3).
fn is_earlier(
    a: &(ToolId, ResourceKind, SimTime),
    b: &(ToolId, ResourceKind, SimTime),
) -> bool {
    (a.2, a.0, a.1.ordinal()) < (b.2, b.0, b.1.ordinal())
}

/// Debits every active tool's remaining work by `elapsed * fair_share_rate`
/// for every resource it still has positive remaining work on, using the
/// denominators captured in `counts` (spec §4.4).
///
/// `elapsed` must be the duration since the active set last changed; the
/// caller is responsible for recomputing `counts` whenever membership
/// changes.
pub fn apply_progress(
    elapsed: f64,
    at: SimTime,
    tools: &mut Slab<ToolInstance>,
    active: &DetHashSet<ToolId>,
    resources: &ResourceTable,
    counts: &ActiveCounts,
) -> Result<(), InvariantViolation> {
    if elapsed <= 0.0 {
        return Ok(());
    }
    for &tool_id in active {
        let Some(tool) = tools.get_mut(tool_id.slab_key()) else { continue };
        for kind in ResourceKind::ALL {
            let remaining = tool.remaining[kind.ordinal()];
            if remaining <= TOLERANCE {
                continue;
            }
            let denom = counts[kind.ordinal()];
            if denom == 0 {
                continue;
            }
            let rate = resources.capacity(kind) / denom as f64;
            let debit = elapsed * rate;
            let next = remaining - debit;
            if next < -TOLERANCE {
                return Err(InvariantViolation::NegativeRemaining { tool: tool_id, resource: kind, at });
            }
            tool.remaining[kind.ordinal()] = next.max(0.0);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use crate::tool::ToolTemplate;

    fn make_tool(slab: &mut Slab<ToolInstance>, request: RequestId, loads: &[(ResourceKind, f64)]) -> ToolId {
        let template = ToolTemplate::new("t", loads.iter().copied()).unwrap();
        let key = slab.insert(ToolInstance::new_pending(ToolId::from_slab_key(0), request, "n".into(), "t".into(), &template));
        let id = ToolId::from_slab_key(key);
        slab[key].id = id;
        slab[key].transition_to_running(SimTime::ZERO);
        id
    }

    #[test]
    fn single_tool_single_resource_completes_at_load_over_capacity() {
        let resources = ResourceTable::new([
            (ResourceKind::Cpu, 100.0),
            (ResourceKind::Npu, 1.0),
            (ResourceKind::Memory, 1.0),
            (ResourceKind::Network, 1.0),
            (ResourceKind::Disk, 1.0),
        ])
        .unwrap();
        let mut tools = Slab::new();
        let mut active = DetHashSet::default();
        let id = make_tool(&mut tools, RequestId::from_slab_key(0), &[(ResourceKind::Cpu, 100.0)]);
        active.insert(id);

        let (tool, kind, t) = find_next_completion(SimTime::ZERO, &tools, &active, &resources).unwrap();
        assert_eq!(tool, id);
        assert_eq!(kind, ResourceKind::Cpu);
        assert!((t.value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn two_tools_share_cpu_fairly() {
        let resources = ResourceTable::new([
            (ResourceKind::Cpu, 100.0),
            (ResourceKind::Npu, 1.0),
            (ResourceKind::Memory, 1.0),
            (ResourceKind::Network, 1.0),
            (ResourceKind::Disk, 1.0),
        ])
        .unwrap();
        let mut tools = Slab::new();
        let mut active = DetHashSet::default();
        let a = make_tool(&mut tools, RequestId::from_slab_key(0), &[(ResourceKind::Cpu, 100.0)]);
        let b = make_tool(&mut tools, RequestId::from_slab_key(1), &[(ResourceKind::Cpu, 100.0)]);
        active.insert(a);
        active.insert(b);

        let counts = count_active_per_resource(&tools, &active);
        assert_eq!(counts[ResourceKind::Cpu.ordinal()], 2);

        let (_, _, t) = find_next_completion(SimTime::ZERO, &tools, &active, &resources).unwrap();
        assert!((t.value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn apply_progress_clamps_at_zero_and_rejects_overdraft() {
        let resources = ResourceTable::new([
            (ResourceKind::Cpu, 100.0),
            (ResourceKind::Npu, 1.0),
            (ResourceKind::Memory, 1.0),
            (ResourceKind::Network, 1.0),
            (ResourceKind::Disk, 1.0),
        ])
        .unwrap();
        let mut tools = Slab::new();
        let mut active = DetHashSet::default();
        let id = make_tool(&mut tools, RequestId::from_slab_key(0), &[(ResourceKind::Cpu, 10.0)]);
        active.insert(id);
        let counts = count_active_per_resource(&tools, &active);

        apply_progress(0.05, SimTime::new(0.05), &mut tools, &active, &resources, &counts).unwrap();
        assert!((tools[id.slab_key()].remaining(ResourceKind::Cpu) - 5.0).abs() < 1e-9);

        let err = apply_progress(1.0, SimTime::new(1.05), &mut tools, &active, &resources, &counts);
        assert!(matches!(err, Err(InvariantViolation::NegativeRemaining { .. })));
    }
}
