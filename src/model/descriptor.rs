use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use crate::model::{pattern::TargetPattern, ParseError};

/// The version side of a selector. Only the preferred version string is
/// carried here; range negotiation happens upstream of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct VersionConstraint {
    preferred: String,
}

impl VersionConstraint {
    pub fn new(preferred: impl Into<String>) -> VersionConstraint {
        VersionConstraint {
            preferred: preferred.into(),
        }
    }

    pub fn preferred(&self) -> &str {
        &self.preferred
    }
}

impl Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.preferred)
    }
}

/// The producer module coordinate requested by a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ModuleSelector {
    pub group: String,
    pub name: String,
    pub version: VersionConstraint,
}

impl ModuleSelector {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: VersionConstraint,
    ) -> ModuleSelector {
        ModuleSelector {
            group: group.into(),
            name: name.into(),
            version,
        }
    }

    pub fn from_notation(notation: &str) -> Result<ModuleSelector, ParseError> {
        let re: Regex = Regex::new(r"^(?P<group>[^:]+):(?P<name>[^:]+):(?P<version>[^:]+)$")
            .unwrap();
        let notation_parse_results = re.captures(notation);
        let notation_parse_results = notation_parse_results.as_ref();

        Ok(ModuleSelector {
            group: notation_parse_results
                .and_then(|c| c.name("group"))
                .map(|s| s.as_str().to_string())
                .ok_or_else(|| {
                    ParseError::MissingNotationComponent("group".to_string(), notation.to_string())
                })?,
            name: notation_parse_results
                .and_then(|c| c.name("name"))
                .map(|s| s.as_str().to_string())
                .ok_or_else(|| {
                    ParseError::MissingNotationComponent("name".to_string(), notation.to_string())
                })?,
            version: notation_parse_results
                .and_then(|c| c.name("version"))
                .map(|s| VersionConstraint::new(s.as_str()))
                .ok_or_else(|| {
                    ParseError::MissingNotationComponent(
                        "version".to_string(),
                        notation.to_string(),
                    )
                })?,
        })
    }
}

impl Display for ModuleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Multi-valued mapping from declared source patterns to target patterns.
///
/// Keys are mapping-rule left-hand sides exactly as declared (`compile`,
/// `%`, `*`, `!test`), not resolved configuration names. Within a key the
/// declared target order is preserved and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationMappings {
    rules: BTreeMap<String, Vec<TargetPattern>>,
}

impl ConfigurationMappings {
    pub fn new() -> ConfigurationMappings {
        ConfigurationMappings::default()
    }

    /// Parses the legacy inline declaration form, e.g.
    /// `"compile->default;test->default,junit(*)"`. Comma-separated sources
    /// on the left fan out over comma-separated targets on the right.
    pub fn parse(declaration: &str) -> Result<ConfigurationMappings, ParseError> {
        let mut mappings = ConfigurationMappings::new();
        for clause in declaration.split(';') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let (sources, targets) = clause
                .split_once("->")
                .ok_or_else(|| ParseError::InvalidMappingClause(clause.to_string()))?;
            let sources = split_pattern_list(sources, clause)?;
            let targets = split_pattern_list(targets, clause)?;
            for source in &sources {
                for target in &targets {
                    mappings.add(*source, target.parse()?);
                }
            }
        }
        Ok(mappings)
    }

    pub fn add(&mut self, source: impl Into<String>, target: TargetPattern) {
        let targets = self.rules.entry(source.into()).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Declared source patterns, in deterministic order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Target patterns declared for `source`; empty when the source has no
    /// rule.
    pub fn targets(&self, source: &str) -> &[TargetPattern] {
        self.rules.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.rules.contains_key(source)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn split_pattern_list<'a>(side: &'a str, clause: &str) -> Result<Vec<&'a str>, ParseError> {
    let patterns: Vec<&str> = side.split(',').map(str::trim).collect();
    if patterns.iter().any(|pattern| pattern.is_empty()) {
        return Err(ParseError::EmptyPattern(clause.to_string()));
    }
    Ok(patterns)
}

/// Prunes transitive dependencies along an edge. The `group` and `module`
/// attributes are matched by the enclosing graph resolver; this crate only
/// decides whether a rule is in scope for a configuration set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ExcludeRule {
    pub group: String,
    pub module: String,
    /// Configurations the rule is scoped to; empty means always active.
    pub configurations: BTreeSet<String>,
}

impl ExcludeRule {
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> ExcludeRule {
        ExcludeRule {
            group: group.into(),
            module: module.into(),
            configurations: BTreeSet::new(),
        }
    }

    pub fn scoped_to(mut self, configuration: impl Into<String>) -> ExcludeRule {
        self.configurations.insert(configuration.into());
        self
    }

    pub fn applies_to(&self, configurations: &BTreeSet<String>) -> bool {
        self.configurations.is_empty()
            || self
                .configurations
                .iter()
                .any(|scoped| configurations.contains(scoped))
    }
}

/// An artifact override declared on a dependency edge, scoped the same way
/// exclude rules are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DependencyArtifact {
    pub name: String,
    pub artifact_type: String,
    pub extension: String,
    /// Configurations the artifact belongs to; empty means every one.
    pub configurations: BTreeSet<String>,
}

impl DependencyArtifact {
    pub fn new(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        extension: impl Into<String>,
    ) -> DependencyArtifact {
        DependencyArtifact {
            name: name.into(),
            artifact_type: artifact_type.into(),
            extension: extension.into(),
            configurations: BTreeSet::new(),
        }
    }

    pub fn scoped_to(mut self, configuration: impl Into<String>) -> DependencyArtifact {
        self.configurations.insert(configuration.into());
        self
    }

    pub fn applies_to(&self, configurations: &BTreeSet<String>) -> bool {
        self.configurations.is_empty()
            || self
                .configurations
                .iter()
                .any(|scoped| configurations.contains(scoped))
    }
}

/// Immutable description of one declared dependency edge: the selector,
/// configuration mapping rules, artifact overrides, exclude rules and
/// resolution flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    selector: ModuleSelector,
    dynamic_constraint_version: String,
    changing: bool,
    transitive: bool,
    optional: bool,
    mappings: ConfigurationMappings,
    artifacts: Vec<DependencyArtifact>,
    excludes: Vec<ExcludeRule>,
}

impl DependencyDescriptor {
    pub fn new(selector: ModuleSelector, mappings: ConfigurationMappings) -> DependencyDescriptor {
        let dynamic_constraint_version = selector.version.preferred().to_string();
        DependencyDescriptor {
            selector,
            dynamic_constraint_version,
            changing: false,
            transitive: true,
            optional: false,
            mappings,
            artifacts: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn builder(selector: ModuleSelector) -> DependencyDescriptorBuilder {
        DependencyDescriptorBuilder {
            selector,
            dynamic_constraint_version: None,
            changing: None,
            transitive: None,
            optional: None,
            mapping_clauses: Vec::new(),
            artifacts: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn selector(&self) -> &ModuleSelector {
        &self.selector
    }

    /// The constraint exactly as originally declared, kept for diagnostics
    /// and re-resolution; selector substitution never rewrites it.
    pub fn dynamic_constraint_version(&self) -> &str {
        &self.dynamic_constraint_version
    }

    pub fn is_changing(&self) -> bool {
        self.changing
    }

    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn mappings(&self) -> &ConfigurationMappings {
        &self.mappings
    }

    /// Declared mapping sources, including the `%`, `*` and `!` forms.
    pub fn module_configurations(&self) -> impl Iterator<Item = &str> {
        self.mappings.sources()
    }

    pub fn artifacts(&self) -> &[DependencyArtifact] {
        &self.artifacts
    }

    pub fn all_excludes(&self) -> &[ExcludeRule] {
        &self.excludes
    }

    /// A descriptor identical to this one but for the selector, as
    /// substituted when conflict resolution picks a different version.
    pub fn with_selector(&self, selector: ModuleSelector) -> DependencyDescriptor {
        DependencyDescriptor {
            selector,
            ..self.clone()
        }
    }
}

impl Display for DependencyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "dependency: {}", self.selector)
    }
}

#[derive(Debug)]
pub struct DependencyDescriptorBuilder {
    selector: ModuleSelector,
    dynamic_constraint_version: Option<String>,
    changing: Option<bool>,
    transitive: Option<bool>,
    optional: Option<bool>,
    mapping_clauses: Vec<String>,
    artifacts: Vec<DependencyArtifact>,
    excludes: Vec<ExcludeRule>,
}

impl DependencyDescriptorBuilder {
    /// Constraint string as originally declared, when it differs from the
    /// selector's preferred version (e.g. a range collapsed upstream).
    pub fn dynamic_constraint_version(mut self, version: impl Into<String>) -> Self {
        self.dynamic_constraint_version = Some(version.into());
        self
    }

    pub fn changing(mut self, changing: bool) -> Self {
        self.changing = Some(changing);
        self
    }

    pub fn transitive(mut self, transitive: bool) -> Self {
        self.transitive = Some(transitive);
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    /// Appends a mapping declaration; may contain several `;`-separated
    /// clauses.
    pub fn mapping(mut self, declaration: impl Into<String>) -> Self {
        self.mapping_clauses.push(declaration.into());
        self
    }

    pub fn artifact(mut self, artifact: DependencyArtifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn exclude(mut self, exclude: ExcludeRule) -> Self {
        self.excludes.push(exclude);
        self
    }

    pub fn try_build(self) -> Result<DependencyDescriptor, ParseError> {
        let Self {
            selector,
            dynamic_constraint_version,
            changing,
            transitive,
            optional,
            mapping_clauses,
            artifacts,
            excludes,
        } = self;

        let mappings = ConfigurationMappings::parse(&mapping_clauses.join(";"))?;
        let dynamic_constraint_version = dynamic_constraint_version
            .unwrap_or_else(|| selector.version.preferred().to_string());

        Ok(DependencyDescriptor {
            selector,
            dynamic_constraint_version,
            changing: changing.unwrap_or(false),
            transitive: transitive.unwrap_or(true),
            optional: optional.unwrap_or(false),
            mappings,
            artifacts,
            excludes,
        })
    }
}
