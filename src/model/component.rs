use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identifies a resolved component in the dependency graph. Used in
/// diagnostics when a mapping cannot be resolved against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ComponentId {
    pub group: String,
    pub module: String,
    pub version: String,
}

impl ComponentId {
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> ComponentId {
        ComponentId {
            group: group.into(),
            module: module.into(),
            version: version.into(),
        }
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

/// A named grouping of artifacts and dependencies within a component.
///
/// The hierarchy lists the configuration itself plus every configuration it
/// transitively extends, most-specific first. The component model owning
/// the configuration keeps the hierarchy acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    name: String,
    visible: bool,
    hierarchy: Vec<String>,
}

impl Configuration {
    /// `extends` is the flattened ancestor closure, most-specific first;
    /// the configuration itself always heads the hierarchy.
    pub fn new(name: impl Into<String>, visible: bool, extends: &[&str]) -> Configuration {
        let name = name.into();
        let mut hierarchy = Vec::with_capacity(extends.len() + 1);
        hierarchy.push(name.clone());
        hierarchy.extend(extends.iter().map(|e| e.to_string()));
        Configuration {
            name,
            visible,
            hierarchy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }
}

/// Read-only view of a component's configurations, as consumed during
/// configuration mapping resolution.
///
/// Implementations must enumerate configuration names in a stable order:
/// resolution output feeds a dependency graph that has to be reproducible.
pub trait ConfigurationSource {
    fn component_id(&self) -> &ComponentId;

    fn configuration(&self, name: &str) -> Option<&Configuration>;

    fn configuration_names(&self) -> Vec<&str>;
}

/// Insertion-ordered, in-memory component model implementing
/// [`ConfigurationSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    id: ComponentId,
    configurations: Vec<Configuration>,
}

impl ComponentMetadata {
    pub fn new(id: ComponentId) -> ComponentMetadata {
        ComponentMetadata {
            id,
            configurations: Vec::new(),
        }
    }

    /// Adds a configuration, replacing any previous one with the same name
    /// so that names stay unique within the component.
    pub fn with_configuration(mut self, configuration: Configuration) -> ComponentMetadata {
        match self
            .configurations
            .iter_mut()
            .find(|existing| existing.name() == configuration.name())
        {
            Some(existing) => *existing = configuration,
            None => self.configurations.push(configuration),
        }
        self
    }
}

impl ConfigurationSource for ComponentMetadata {
    fn component_id(&self) -> &ComponentId {
        &self.id
    }

    fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations
            .iter()
            .find(|configuration| configuration.name() == name)
    }

    fn configuration_names(&self) -> Vec<&str> {
        self.configurations
            .iter()
            .map(Configuration::name)
            .collect()
    }
}
