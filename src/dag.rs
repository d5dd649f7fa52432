//! DAG templates for request types (spec §3 "Request", §6 "DAG provider").
//!
//! A [`Dag`] is immutable, external configuration: node names, their
//! predecessor edges, and which tool template each node uses. The engine
//! materializes a fresh set of [`crate::tool::ToolInstance`]s from a `Dag`
//! on every request arrival; the `Dag` itself is never mutated by a run.

use smallvec::SmallVec;

use crate::error::ConfigError;
use crate::util::DetHashMap;

/// Most DAG nodes in practice have a small, fixed number of direct
/// predecessors/successors, so these edge lists live inline rather than
/// behind a heap allocation in the common case.
type EdgeList = SmallVec<[String; 4]>;

/// One node in a request's DAG: which tool template it runs and which other
/// nodes must complete before it can start.
#[derive(Debug, Clone)]
pub struct DagNode {
    pub template: String,
    pub predecessors: EdgeList,
}

/// A DAG of tool dependencies for one request type (spec §3 "Request").
#[derive(Debug, Clone)]
pub struct Dag {
    nodes: DetHashMap<String, DagNode>,
    successors: DetHashMap<String, EdgeList>,
    /// Root nodes (zero predecessors), in insertion order for deterministic
    /// start-event enqueue ordering on arrival (spec §4.6).
    roots: Vec<String>,
}

impl Dag {
    /// Builds a DAG from `(node name, template name, predecessor names)`
    /// triples, validating acyclicity and that every predecessor reference
    /// resolves to a node in the same DAG (spec §7: "DAG contains a cycle",
    /// "predecessor list refers to an unknown node").
    pub fn new(
        request_type: &str,
        nodes: impl IntoIterator<Item = (String, String, Vec<String>)>,
    ) -> Result<Self, ConfigError> {
        let mut map: DetHashMap<String, DagNode> = DetHashMap::default();
        let mut order: Vec<String> = Vec::new();
        for (name, template, predecessors) in nodes {
            order.push(name.clone());
            map.insert(name, DagNode { template, predecessors: EdgeList::from_vec(predecessors) });
        }

        for name in &order {
            let node = &map[name];
            for pred in &node.predecessors {
                if !map.contains_key(pred) {
                    return Err(ConfigError::UnknownPredecessor {
                        node: name.clone(),
                        predecessor: pred.clone(),
                    });
                }
            }
        }

        assert_acyclic(request_type, &map)?;

        let mut successors: DetHashMap<String, EdgeList> = DetHashMap::default();
        for name in &order {
            successors.entry(name.clone()).or_default();
        }
        for (name, node) in &map {
            for pred in &node.predecessors {
                successors.entry(pred.clone()).or_default().push(name.clone());
            }
        }

        let roots: Vec<String> = order
            .iter()
            .filter(|name| map[*name].predecessors.is_empty())
            .cloned()
            .collect();

        Ok(Self { nodes: map, successors, roots })
    }

    /// Root nodes (zero predecessors), in the order they were declared.
    #[must_use]
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Returns the node, if present.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&DagNode> {
        self.nodes.get(name)
    }

    /// All node names, for materializing a request's tool instances.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Direct successors of `name`.
    #[must_use]
    pub fn successors(&self, name: &str) -> &[String] {
        self.successors.get(name).map_or(&[], |s| s.as_slice())
    }

    /// True iff every predecessor of `name` is in `completed`.
    #[must_use]
    pub fn predecessors_satisfied(&self, name: &str, mut is_completed: impl FnMut(&str) -> bool) -> bool {
        self.nodes
            .get(name)
            .is_some_and(|n| n.predecessors.iter().all(|p| is_completed(p)))
    }
}

fn assert_acyclic(request_type: &str, nodes: &DetHashMap<String, DagNode>) -> Result<(), ConfigError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks: DetHashMap<&str, Mark> = DetHashMap::default();
    for name in nodes.keys() {
        marks.insert(name.as_str(), Mark::Unvisited);
    }

    fn visit<'a>(
        name: &'a str,
        nodes: &'a DetHashMap<String, DagNode>,
        marks: &mut DetHashMap<&'a str, Mark>,
    ) -> bool {
        match marks.get(name) {
            Some(Mark::Done) => return true,
            Some(Mark::InProgress) => return false,
            _ => {}
        }
        marks.insert(name, Mark::InProgress);
        if let Some(node) = nodes.get(name) {
            for pred in &node.predecessors {
                if !visit(pred.as_str(), nodes, marks) {
                    return false;
                }
            }
        }
        marks.insert(name, Mark::Done);
        true
    }

    let names: Vec<&str> = nodes.keys().map(String::as_str).collect();
    for name in names {
        if !visit(name, nodes, &mut marks) {
            return Err(ConfigError::CyclicDag {
                request_type: request_type.to_string(),
            });
        }
    }
    Ok(())
}
