//! External collaborator interfaces (spec §6 "Inputs consumed").
//!
//! DAG loading from configuration and tool-template catalogs are explicitly
//! out of scope for the engine (spec §1); these traits are the seam the
//! engine consumes them through. `StaticCatalog` is a minimal in-memory
//! implementation used by tests and small embedders that don't need a real
//! configuration loader.

use crate::dag::Dag;
use crate::tool::ToolTemplate;
use crate::util::DetHashMap;

/// Pure lookup from tool template name to its per-resource loads.
pub trait TemplateProvider {
    fn template(&self, name: &str) -> Option<&ToolTemplate>;
}

/// Pure lookup from request type to its DAG.
pub trait DagProvider {
    fn dag(&self, request_type: &str) -> Option<&Dag>;
}

/// An in-memory catalog of templates and DAGs, for tests and simple
/// embedders.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    templates: DetHashMap<String, ToolTemplate>,
    dags: DetHashMap<String, Dag>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, template: ToolTemplate) -> Self {
        self.templates.insert(name.into(), template);
        self
    }

    #[must_use]
    pub fn with_dag(mut self, request_type: impl Into<String>, dag: Dag) -> Self {
        self.dags.insert(request_type.into(), dag);
        self
    }
}

impl TemplateProvider for StaticCatalog {
    fn template(&self, name: &str) -> Option<&ToolTemplate> {
        self.templates.get(name)
    }
}

impl DagProvider for StaticCatalog {
    fn dag(&self, request_type: &str) -> Option<&Dag> {
        self.dags.get(request_type)
    }
}
