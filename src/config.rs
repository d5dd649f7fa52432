//! TOML configuration loading for resource capacities, tool templates, and
//! DAGs (spec §6 "Inputs consumed"; feature-gated since the engine itself
//! never parses configuration — spec §1).
//!
//! This module is one possible [`crate::providers::TemplateProvider`] /
//! [`crate::providers::DagProvider`] source; embedders are free to supply
//! their own instead. Available only with the `config-file` feature.

use serde::Deserialize;

use crate::dag::Dag;
use crate::error::ConfigError;
use crate::providers::{DagProvider, StaticCatalog, TemplateProvider};
use crate::resource::{ResourceKind, ResourceTable};
use crate::tool::ToolTemplate;

/// The root of a simulation configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub resources: ResourceTableConfig,
    #[serde(default)]
    pub templates: Vec<ToolTemplateConfig>,
    #[serde(default)]
    pub dags: Vec<DagConfig>,
}

/// `[resources]`: total capacity for each resource kind.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceTableConfig {
    pub cpu: f64,
    pub npu: f64,
    pub memory: f64,
    pub network: f64,
    pub disk: f64,
}

impl ResourceTableConfig {
    fn into_table(self) -> Result<ResourceTable, ConfigError> {
        ResourceTable::new([
            (ResourceKind::Cpu, self.cpu),
            (ResourceKind::Npu, self.npu),
            (ResourceKind::Memory, self.memory),
            (ResourceKind::Network, self.network),
            (ResourceKind::Disk, self.disk),
        ])
    }
}

/// `[[templates]]`: one named tool template and its per-resource loads.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolTemplateConfig {
    pub name: String,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub npu: f64,
    #[serde(default)]
    pub memory: f64,
    #[serde(default)]
    pub network: f64,
    #[serde(default)]
    pub disk: f64,
}

impl ToolTemplateConfig {
    fn into_template(self) -> Result<(String, ToolTemplate), ConfigError> {
        let template = ToolTemplate::new(
            &self.name,
            [
                (ResourceKind::Cpu, self.cpu),
                (ResourceKind::Npu, self.npu),
                (ResourceKind::Memory, self.memory),
                (ResourceKind::Network, self.network),
                (ResourceKind::Disk, self.disk),
            ],
        )?;
        Ok((self.name, template))
    }
}

/// `[[dags]]`: one request type's DAG, as a flat list of nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct DagConfig {
    pub request_type: String,
    pub nodes: Vec<DagNodeConfig>,
}

/// One node within a `[[dags]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DagNodeConfig {
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub predecessors: Vec<String>,
}

impl DagConfig {
    fn into_dag(self) -> Result<(String, Dag), ConfigError> {
        let request_type = self.request_type;
        let nodes = self
            .nodes
            .into_iter()
            .map(|n| (n.name, n.template, n.predecessors));
        let dag = Dag::new(&request_type, nodes)?;
        Ok((request_type, dag))
    }
}

impl SimulationConfig {
    /// Parses a configuration document from its TOML source text.
    pub fn parse(source: &str) -> Result<Self, ConfigLoadError> {
        toml::from_str(source).map_err(ConfigLoadError::Toml)
    }

    /// Validates and converts this configuration into a resource table and
    /// a [`StaticCatalog`] implementing both [`TemplateProvider`] and
    /// [`DagProvider`].
    pub fn build(self) -> Result<(ResourceTable, StaticCatalog), ConfigError> {
        let resources = self.resources.into_table()?;
        let mut catalog = StaticCatalog::new();
        for template_config in self.templates {
            let (name, template) = template_config.into_template()?;
            catalog = catalog.with_template(name, template);
        }
        for dag_config in self.dags {
            let (request_type, dag) = dag_config.into_dag()?;
            catalog = catalog.with_dag(request_type, dag);
        }
        Ok((resources, catalog))
    }
}

/// Failures while loading a configuration document: either it isn't valid
/// TOML, or it parses but fails semantic validation (negative loads, cyclic
/// DAGs, and so on — see [`ConfigError`]).
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("invalid configuration syntax: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Semantic(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let source = r#"
            [resources]
            cpu = 100.0
            npu = 4.0
            memory = 64.0
            network = 100.0
            disk = 100.0

            [[templates]]
            name = "solo"
            cpu = 10.0

            [[dags]]
            request_type = "simple"
            [[dags.nodes]]
            name = "only"
            template = "solo"
        "#;
        let config = SimulationConfig::parse(source).unwrap();
        let (resources, catalog) = config.build().unwrap();
        assert_eq!(resources.capacity(ResourceKind::Cpu), 100.0);
        assert!(catalog.template("solo").is_some());
        assert!(catalog.dag("simple").is_some());
    }

    #[test]
    fn rejects_negative_capacity() {
        let source = r#"
            [resources]
            cpu = -1.0
            npu = 1.0
            memory = 1.0
            network = 1.0
            disk = 1.0
        "#;
        let config = SimulationConfig::parse(source).unwrap();
        let err = config.build();
        assert!(matches!(err, Err(ConfigError::NonPositiveCapacity { .. })));
    }
}
