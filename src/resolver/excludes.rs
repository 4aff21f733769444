use std::collections::BTreeSet;

use crate::model::descriptor::{DependencyArtifact, DependencyDescriptor, ExcludeRule};

/// Exclude rules of `descriptor` in scope for the supplied configuration
/// set, in declaration order. The graph resolver queries this with the
/// selected target configurations to gate transitive expansion.
pub fn applicable_excludes<'a>(
    descriptor: &'a DependencyDescriptor,
    configurations: &BTreeSet<String>,
) -> Vec<&'a ExcludeRule> {
    descriptor
        .all_excludes()
        .iter()
        .filter(|rule| rule.applies_to(configurations))
        .collect()
}

/// Artifact overrides of `descriptor` in scope for the supplied
/// configuration set, in declaration order.
pub fn configuration_artifacts<'a>(
    descriptor: &'a DependencyDescriptor,
    configurations: &BTreeSet<String>,
) -> Vec<&'a DependencyArtifact> {
    descriptor
        .artifacts()
        .iter()
        .filter(|artifact| artifact.applies_to(configurations))
        .collect()
}
