pub mod model;
pub mod resolver;

pub use model::{
    component::{ComponentId, ComponentMetadata, Configuration, ConfigurationSource},
    descriptor::{
        ConfigurationMappings, DependencyArtifact, DependencyDescriptor,
        DependencyDescriptorBuilder, ExcludeRule, ModuleSelector, VersionConstraint,
    },
    pattern::TargetPattern,
    ParseError,
};
pub use resolver::{
    excludes::{applicable_excludes, configuration_artifacts},
    select_configurations, ComponentResolver, ResolutionError,
};
