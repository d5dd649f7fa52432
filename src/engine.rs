//! The simulation engine — the outer loop (spec §4.5).
//!
//! At each step the engine picks the earlier of the next start event and the
//! next synthesized completion, advances time, and accounts progress over
//! the elapsed interval. Every tool that reached full exhaustion at the new
//! current time is then finalized — there can be more than one — and,
//! finally, a start event due at exactly this instant is dispatched.
//! Completions are never stored; they are recomputed from live state every
//! iteration (spec §1 "The design deliberately refuses to pre-schedule
//! completion events").

use slab::Slab;

use crate::dag::Dag;
use crate::error::{ConfigError, EngineError, InvariantViolation};
use crate::event::{Event, EventQueue};
use crate::ids::{RequestId, ToolId};
use crate::metrics::{LatencySample, MetricsSink, UtilizationSnapshot};
use crate::providers::{DagProvider, TemplateProvider};
use crate::request::Request;
use crate::resource::{ResourceKind, ResourceTable};
use crate::scheduler::{apply_progress, count_active_per_resource, find_next_completion};
use crate::time::SimTime;
use crate::tool::{ToolInstance, ToolStatus};
use crate::util::DetHashSet;

/// How a `run` call terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue and active set both drained before the deadline (spec §7
    /// "Exhaustion"). Not an error.
    Exhausted,
    /// The run deadline (`until`) was reached with work still outstanding.
    DeadlineReached,
}

/// The discrete-event simulation engine.
///
/// Generic over its three external collaborators (spec §6): a tool template
/// catalog, a DAG catalog, and a metrics sink. None of the three is boxed by
/// default, so driving a run costs no dynamic dispatch beyond what the
/// collaborator itself does.
pub struct Simulation<T, D, M> {
    pub(crate) current_time: SimTime,
    pub(crate) queue: EventQueue,
    pub(crate) resources: ResourceTable,
    pub(crate) tools: Slab<ToolInstance>,
    pub(crate) requests: Slab<Request>,
    pub(crate) active: DetHashSet<ToolId>,
    templates: T,
    dags: D,
    metrics: M,
    snapshot_every_step: bool,
}

impl<T, D, M> Simulation<T, D, M>
where
    T: TemplateProvider,
    D: DagProvider,
    M: MetricsSink,
{
    #[must_use]
    pub fn new(resources: ResourceTable, templates: T, dags: D, metrics: M) -> Self {
        Self {
            current_time: SimTime::ZERO,
            queue: EventQueue::new(),
            resources,
            tools: Slab::new(),
            requests: Slab::new(),
            active: DetHashSet::default(),
            templates,
            dags,
            metrics,
            snapshot_every_step: false,
        }
    }

    /// Reassembles a `Simulation` from its run state and a fresh set of
    /// collaborators. Used by [`crate::snapshot::EngineSnapshot::restore`]
    /// to resume a run; not exposed as a public constructor since the run
    /// state alone is not a meaningful starting point without having come
    /// from a snapshot.
    pub(crate) fn from_parts(
        current_time: SimTime,
        queue: EventQueue,
        resources: ResourceTable,
        tools: Slab<ToolInstance>,
        requests: Slab<Request>,
        active: DetHashSet<ToolId>,
        templates: T,
        dags: D,
        metrics: M,
    ) -> Self {
        Self {
            current_time,
            queue,
            resources,
            tools,
            requests,
            active,
            templates,
            dags,
            metrics,
            snapshot_every_step: false,
        }
    }

    /// Enables a utilization snapshot on every step (spec §6: "Per-step
    /// (optional snapshot hook)"). Off by default; the engine only offers
    /// the hook, the metrics collaborator decides whether to use it.
    pub fn enable_step_snapshots(&mut self, enabled: bool) {
        self.snapshot_every_step = enabled;
    }

    #[must_use]
    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    #[must_use]
    pub fn active_tool_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    #[must_use]
    pub fn metrics_mut(&mut self) -> &mut M {
        &mut self.metrics
    }

    #[must_use]
    pub fn request(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(id.slab_key())
    }

    #[must_use]
    pub fn tool(&self, id: ToolId) -> Option<&ToolInstance> {
        self.tools.get(id.slab_key())
    }

    /// Pushes a request-arrival start event (spec §6 "Run control:
    /// `schedule(event)`").
    pub fn schedule_arrival(&mut self, request_type: impl Into<String>, at: SimTime) {
        self.queue.push(Event::RequestArrival { request_type: request_type.into() }, at);
    }

    /// Drives the loop until the queue is empty and the active set is
    /// empty, or simulated time exceeds `until` (spec §6 "Run control:
    /// `run(until)`").
    pub fn run(&mut self, until: SimTime) -> Result<RunOutcome, EngineError> {
        loop {
            let t_start = self.queue.peek_time();
            if !self.queue.is_empty() && t_start < self.current_time {
                return Err(InvariantViolation::TimestampRegression {
                    event_time: t_start,
                    current_time: self.current_time,
                }
                .into());
            }

            let completion = find_next_completion(self.current_time, &self.tools, &self.active, &self.resources);
            if completion.is_none() && !self.active.is_empty() {
                return Err(InvariantViolation::NoCompletionCandidate { at: self.current_time }.into());
            }
            let t_complete = completion.map_or(SimTime::INFINITY, |(_, _, t)| t);

            let t_next = t_start.min(t_complete);
            if t_next.is_infinite() {
                return Ok(RunOutcome::Exhausted);
            }
            if t_next > until {
                return Ok(RunOutcome::DeadlineReached);
            }

            let counts = count_active_per_resource(&self.tools, &self.active);
            let elapsed = self.current_time.elapsed_until(t_next);
            apply_progress(elapsed, t_next, &mut self.tools, &self.active, &self.resources, &counts)?;
            self.current_time = t_next;

            if self.snapshot_every_step {
                self.emit_snapshot();
            }

            // Finalize every tool whose remaining work just reached zero on
            // every resource, regardless of whether a start event is also
            // due at this same instant. A completion is never suppressed by
            // a coincident start — the tie rule below only decides dispatch
            // *order*, not whether the completion happens (spec §4.5, §4.8).
            let mut newly_completed: Vec<ToolId> = self
                .active
                .iter()
                .copied()
                .filter(|&id| self.tools[id.slab_key()].is_fully_exhausted())
                .collect();
            newly_completed.sort_unstable();
            for tool_id in newly_completed {
                self.finalize_completion(tool_id)?;
            }

            // Start-before-completion tie rule (spec §4.5): a start event
            // due exactly now is dispatched this step; a completion that is
            // strictly earlier was already finalized above, and one due
            // exactly now was just finalized too.
            if t_start == t_next {
                let (_, event) = self.queue.pop_earliest().expect("queue peeked non-empty");
                self.dispatch(event)?;
            }
        }
    }

    fn emit_snapshot(&mut self) {
        let mut utilization = [0.0_f64; ResourceKind::ALL.len()];
        let counts = count_active_per_resource(&self.tools, &self.active);
        for kind in ResourceKind::ALL {
            utilization[kind.ordinal()] = if counts[kind.ordinal()] > 0 { 1.0 } else { 0.0 };
        }
        self.metrics.record_snapshot(UtilizationSnapshot {
            at: self.current_time,
            active_tool_count: self.active.len(),
            utilization,
        });
    }

    fn dispatch(&mut self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::RequestArrival { request_type } => self.handle_request_arrival(request_type),
            Event::ToolStart { request, node } => self.handle_tool_start(request, node),
        }
    }

    /// Materializes a request's DAG into tool instances and enqueues a
    /// start event for every root (spec §4.6).
    fn handle_request_arrival(&mut self, request_type: String) -> Result<(), EngineError> {
        let request_id = RequestId::from_slab_key(self.requests.vacant_key());

        let (node_templates, roots): (Vec<(String, String)>, Vec<String>) = {
            let dag: &Dag = self
                .dags
                .dag(&request_type)
                .ok_or_else(|| ConfigError::UnknownRequestType { request_type: request_type.clone() })?;
            let node_templates = dag
                .node_names()
                .map(|name| (name.to_string(), dag.node(name).expect("name came from node_names").template.clone()))
                .collect();
            (node_templates, dag.roots().to_vec())
        };

        let mut request = Request::new(request_id, request_type.clone(), self.current_time);
        for (node_name, template_name) in &node_templates {
            let template = self
                .templates
                .template(template_name)
                .ok_or_else(|| ConfigError::MissingTemplate {
                    node: node_name.clone(),
                    template: template_name.clone(),
                })?;
            let slab_key = self.tools.insert(ToolInstance::new_pending(
                ToolId::from_slab_key(0),
                request_id,
                node_name.clone(),
                template_name.clone(),
                template,
            ));
            let tool_id = ToolId::from_slab_key(slab_key);
            self.tools[slab_key].id = tool_id;
            request.insert_tool(node_name.clone(), tool_id);
        }

        let inserted_key = self.requests.insert(request);
        debug_assert_eq!(inserted_key, request_id.slab_key());

        for root in roots {
            self.queue.push(Event::ToolStart { request: request_id, node: root }, self.current_time);
        }

        tracing::debug!(request = %request_id, request_type = %request_type, "request arrived");
        Ok(())
    }

    /// Transitions a pending tool to running (spec §4.7).
    fn handle_tool_start(&mut self, request_id: RequestId, node: String) -> Result<(), EngineError> {
        let at = self.current_time;

        let (tool_id, predecessor_tool_ids) = {
            let request = self
                .requests
                .get(request_id.slab_key())
                .ok_or(InvariantViolation::UnknownRequest { request: request_id })?;
            let tool_id = request
                .tool(&node)
                .ok_or_else(|| InvariantViolation::UnknownDagNode { request: request_id, node: node.clone(), at })?;
            let dag = self
                .dags
                .dag(request.request_type())
                .ok_or_else(|| ConfigError::UnknownRequestType { request_type: request.request_type().to_string() })?;
            let predecessors = dag
                .node(&node)
                .map(|n| n.predecessors.clone())
                .unwrap_or_default();
            let predecessor_tool_ids: Vec<ToolId> =
                predecessors.iter().filter_map(|p| request.tool(p)).collect();
            (tool_id, predecessor_tool_ids)
        };

        {
            let tool = self.tools.get(tool_id.slab_key()).ok_or(InvariantViolation::UnknownTool { tool: tool_id })?;
            if tool.status() != ToolStatus::Pending {
                return Err(InvariantViolation::ToolNotPending { tool: tool_id, at }.into());
            }
        }
        for predecessor in predecessor_tool_ids {
            let pred = self.tools.get(predecessor.slab_key()).ok_or(InvariantViolation::UnknownTool { tool: predecessor })?;
            if pred.status() != ToolStatus::Completed {
                return Err(InvariantViolation::PredecessorIncomplete { tool: tool_id, predecessor, at }.into());
            }
        }

        let tool = self.tools.get_mut(tool_id.slab_key()).expect("checked above");
        tool.transition_to_running(at);
        self.active.insert(tool_id);

        tracing::trace!(tool = %tool_id, request = %request_id, node = %node, at = %at, "tool started");
        Ok(())
    }

    /// Finalizes a tool instance whose remaining work across every resource
    /// has already reached zero: transitions it to `Completed`, walks its
    /// DAG successors for newly-eligible starts, and records the owning
    /// request's completion once every one of its tools is done (spec §4.8).
    ///
    /// The caller is responsible for only invoking this once `tool_id` is
    /// actually fully exhausted — a tool that has exhausted only some of its
    /// resources stays active and is left for a later call once the rest of
    /// its work drains.
    fn finalize_completion(&mut self, tool_id: ToolId) -> Result<(), EngineError> {
        let at = self.current_time;

        let request_id = {
            let tool = self.tools.get_mut(tool_id.slab_key()).expect("tool_id came from the active set");
            tool.transition_to_completed(at);
            tool.request()
        };
        self.active.remove(&tool_id);
        tracing::trace!(tool = %tool_id, at = %at, "tool completed");

        let node_name = self.tools[tool_id.slab_key()].node().to_string();

        let ready_successors: Vec<String> = {
            let request = self
                .requests
                .get(request_id.slab_key())
                .ok_or(InvariantViolation::UnknownRequest { request: request_id })?;
            let dag = self
                .dags
                .dag(request.request_type())
                .ok_or_else(|| ConfigError::UnknownRequestType { request_type: request.request_type().to_string() })?;
            dag.successors(&node_name)
                .iter()
                .filter(|succ| {
                    let is_pending = request
                        .tool(succ)
                        .and_then(|id| self.tools.get(id.slab_key()))
                        .is_some_and(|t| t.status() == ToolStatus::Pending);
                    is_pending
                        && dag.predecessors_satisfied(succ, |pred| {
                            request
                                .tool(pred)
                                .and_then(|id| self.tools.get(id.slab_key()))
                                .is_some_and(|t| t.status() == ToolStatus::Completed)
                        })
                })
                .cloned()
                .collect()
        };

        for succ in ready_successors {
            self.queue.push(Event::ToolStart { request: request_id, node: succ }, at);
        }

        let all_completed = {
            let request = self.requests.get(request_id.slab_key()).expect("checked above");
            request
                .tools()
                .all(|(_, id)| self.tools.get(id.slab_key()).is_some_and(|t| t.status() == ToolStatus::Completed))
        };

        if all_completed {
            let request = self.requests.get_mut(request_id.slab_key()).expect("checked above");
            request.set_finish_time(at);
            let sample = LatencySample {
                request: request_id,
                arrival: request.arrival_time(),
                finish: at,
                latency: request.latency().expect("finish time just set"),
            };
            self.metrics.record_completion(sample);
            tracing::debug!(request = %request_id, latency = sample.latency, "request completed");
        }

        Ok(())
    }
}
