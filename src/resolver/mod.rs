pub mod excludes;

use std::collections::BTreeSet;

use log::debug;
use thiserror::Error;

use crate::model::{
    component::{ComponentId, ComponentMetadata, Configuration, ConfigurationSource},
    descriptor::{DependencyDescriptor, ModuleSelector},
    pattern::TargetPattern,
};

/// Resolves a selector to producer component metadata. Implemented by the
/// enclosing graph resolver; this crate only consumes the result.
pub trait ComponentResolver {
    fn resolve(&self, selector: &ModuleSelector) -> anyhow::Result<ComponentMetadata>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(
        "Configuration `{from_configuration}` of {from_component} maps to `{pattern}`, \
         which does not exist in {target_component}"
    )]
    ConfigurationNotFound {
        from_component: ComponentId,
        from_configuration: String,
        pattern: String,
        target_component: ComponentId,
    },
}

/// Selects the target configurations of `target` that satisfy
/// `from_configuration` under the descriptor's mapping rules.
///
/// Rules are additive: every hierarchy entry of `from_configuration` with an
/// explicit rule contributes, the `%` rule contributes only when no explicit
/// rule matched anywhere in the hierarchy, and the `*` rule contributes
/// unless a `!name` key negates it for some hierarchy entry. Negation
/// suppresses only the wildcard rule, never explicit or default rules; this
/// asymmetry is inherited from the legacy format and kept as is, including
/// the known imprecision that `*,!A->A;*,!B->B` does not produce true swap
/// semantics.
///
/// The result preserves first-insertion order and collapses duplicates, so
/// repeated resolution of the same edge is order-stable.
pub fn select_configurations<'a, S>(
    descriptor: &DependencyDescriptor,
    from_component: &ComponentId,
    from_configuration: &Configuration,
    target: &'a S,
) -> Result<Vec<&'a Configuration>, ResolutionError>
where
    S: ConfigurationSource + ?Sized,
{
    let mappings = descriptor.mappings();
    let from_name = from_configuration.name();
    let mut targets: Vec<&Configuration> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    let mut matched = false;
    for entry in from_configuration.hierarchy() {
        let patterns = mappings.targets(entry);
        if !patterns.is_empty() {
            matched = true;
            debug!("Hierarchy entry `{entry}` of `{from_name}` has an explicit mapping rule");
        }
        for pattern in patterns {
            resolve_pattern(
                pattern,
                from_component,
                from_name,
                entry,
                target,
                &mut targets,
                &mut seen,
            )?;
        }
    }

    if !matched && mappings.contains_source("%") {
        debug!("No explicit rule matched `{from_name}`, applying the `%` default rule");
        for pattern in mappings.targets("%") {
            resolve_pattern(
                pattern,
                from_component,
                from_name,
                from_name,
                target,
                &mut targets,
                &mut seen,
            )?;
        }
    }

    let wildcard_patterns = mappings.targets("*");
    if !wildcard_patterns.is_empty() {
        let negated = from_configuration
            .hierarchy()
            .iter()
            .find(|entry| mappings.contains_source(&format!("!{entry}")));
        match negated {
            Some(entry) => {
                debug!("Wildcard rule suppressed for `{from_name}` by `!{entry}`");
            }
            None => {
                for pattern in wildcard_patterns {
                    resolve_pattern(
                        pattern,
                        from_component,
                        from_name,
                        from_name,
                        target,
                        &mut targets,
                        &mut seen,
                    )?;
                }
            }
        }
    }

    Ok(targets)
}

fn resolve_pattern<'a, S>(
    pattern: &TargetPattern,
    from_component: &ComponentId,
    from_configuration: &str,
    pattern_configuration: &str,
    target: &'a S,
    targets: &mut Vec<&'a Configuration>,
    seen: &mut BTreeSet<&'a str>,
) -> Result<(), ResolutionError>
where
    S: ConfigurationSource + ?Sized,
{
    match pattern {
        TargetPattern::Fallback {
            preferred,
            fallback,
        } => {
            if let Some(configuration) = target.configuration(preferred) {
                accumulate(configuration, targets, seen);
                return Ok(());
            }
            resolve_pattern(
                fallback,
                from_component,
                from_configuration,
                pattern_configuration,
                target,
                targets,
                seen,
            )
        }
        TargetPattern::Wildcard => {
            for name in target.configuration_names() {
                if let Some(configuration) = target.configuration(name) {
                    if configuration.is_visible() {
                        accumulate(configuration, targets, seen);
                    }
                }
            }
            Ok(())
        }
        TargetPattern::SelfRef => lookup(
            pattern_configuration,
            from_component,
            from_configuration,
            target,
            targets,
            seen,
        ),
        TargetPattern::FromRef => lookup(
            from_configuration,
            from_component,
            from_configuration,
            target,
            targets,
            seen,
        ),
        TargetPattern::Plain { name } => lookup(
            name,
            from_component,
            from_configuration,
            target,
            targets,
            seen,
        ),
    }
}

// Exact lookup of a plain name, after any `@`/`#`/fallback substitution.
fn lookup<'a, S>(
    name: &str,
    from_component: &ComponentId,
    from_configuration: &str,
    target: &'a S,
    targets: &mut Vec<&'a Configuration>,
    seen: &mut BTreeSet<&'a str>,
) -> Result<(), ResolutionError>
where
    S: ConfigurationSource + ?Sized,
{
    match target.configuration(name) {
        Some(configuration) => {
            accumulate(configuration, targets, seen);
            Ok(())
        }
        None => Err(ResolutionError::ConfigurationNotFound {
            from_component: from_component.clone(),
            from_configuration: from_configuration.to_string(),
            pattern: name.to_string(),
            target_component: target.component_id().clone(),
        }),
    }
}

fn accumulate<'a>(
    configuration: &'a Configuration,
    targets: &mut Vec<&'a Configuration>,
    seen: &mut BTreeSet<&'a str>,
) {
    if seen.insert(configuration.name()) {
        targets.push(configuration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::{ConfigurationMappings, VersionConstraint};
    use pretty_assertions::assert_eq;

    fn consumer_id() -> ComponentId {
        ComponentId::new("org.example", "app", "1.0")
    }

    fn producer() -> ComponentMetadata {
        ComponentMetadata::new(ComponentId::new("org.example", "widgets", "2.0"))
            .with_configuration(Configuration::new("default", true, &["runtime"]))
            .with_configuration(Configuration::new("runtime", true, &["compile"]))
            .with_configuration(Configuration::new("compile", true, &[]))
            .with_configuration(Configuration::new("internal", false, &[]))
    }

    fn descriptor(declaration: &str) -> DependencyDescriptor {
        let selector =
            ModuleSelector::new("org.example", "widgets", VersionConstraint::new("2.0"));
        DependencyDescriptor::new(selector, ConfigurationMappings::parse(declaration).unwrap())
    }

    fn names(configurations: &[&Configuration]) -> Vec<String> {
        configurations
            .iter()
            .map(|configuration| configuration.name().to_string())
            .collect()
    }

    #[test]
    fn explicit_rule_selects_its_targets() {
        let descriptor = descriptor("compile->default");
        let from = Configuration::new("compile", true, &[]);
        let producer = producer();

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&targets), ["default"]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let descriptor = descriptor("test->runtime,default;*->compile");
        let from = Configuration::new("test", true, &["runtime", "compile"]);
        let producer = producer();

        let first =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        let second =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&first), ["runtime", "default", "compile"]);
        assert_eq!(first, second);
    }

    #[test]
    fn hierarchy_entries_accumulate_without_duplicates() {
        let descriptor = descriptor("test->runtime;runtime->runtime,compile");
        let from = Configuration::new("test", true, &["runtime"]);
        let producer = producer();

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&targets), ["runtime", "compile"]);
    }

    #[test]
    fn fallback_prefers_the_existing_configuration() {
        let producer = producer();
        let from = Configuration::new("compile", true, &[]);

        let targets = select_configurations(
            &descriptor("compile->default(compile)"),
            &consumer_id(),
            &from,
            &producer,
        )
        .unwrap();
        assert_eq!(names(&targets), ["default"]);
    }

    #[test]
    fn fallback_applies_when_preferred_is_missing() {
        let producer = producer();
        let from = Configuration::new("compile", true, &[]);

        let targets = select_configurations(
            &descriptor("compile->provided(compile)"),
            &consumer_id(),
            &from,
            &producer,
        )
        .unwrap();
        assert_eq!(names(&targets), ["compile"]);
    }

    #[test]
    fn fallback_to_wildcard_expands_visible_configurations() {
        let producer = producer();
        let from = Configuration::new("compile", true, &[]);

        let targets = select_configurations(
            &descriptor("compile->provided(*)"),
            &consumer_id(),
            &from,
            &producer,
        )
        .unwrap();
        assert_eq!(names(&targets), ["default", "runtime", "compile"]);
    }

    #[test]
    fn wildcard_skips_invisible_configurations() {
        let descriptor = descriptor("deep->*");
        let from = Configuration::new("deep", true, &["test", "runtime"]);
        let producer = producer();

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&targets), ["default", "runtime", "compile"]);
    }

    #[test]
    fn global_wildcard_rule_adds_to_explicit_rules() {
        let descriptor = descriptor("compile->default;*->compile");
        let from = Configuration::new("compile", true, &[]);
        let producer = producer();

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&targets), ["default", "compile"]);
    }

    #[test]
    fn negation_suppresses_only_the_wildcard_rule() {
        let descriptor = descriptor("test->runtime;*->default;!test->default");
        let from = Configuration::new("test", true, &[]);
        let producer = producer();

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&targets), ["runtime"]);
    }

    #[test]
    fn negation_matches_anywhere_in_the_hierarchy() {
        let descriptor = descriptor("*->default;!compile->default");
        let from = Configuration::new("test", true, &["compile"]);
        let producer = producer();

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&targets), Vec::<String>::new());
    }

    #[test]
    fn default_rule_fires_only_without_explicit_matches() {
        let producer = producer();
        let from = Configuration::new("test", true, &["runtime"]);

        let fallback = select_configurations(
            &descriptor("compile->compile;%->default"),
            &consumer_id(),
            &from,
            &producer,
        )
        .unwrap();
        assert_eq!(names(&fallback), ["default"]);

        // An explicit match on any hierarchy entry suppresses `%`.
        let explicit = select_configurations(
            &descriptor("runtime->runtime;%->default"),
            &consumer_id(),
            &from,
            &producer,
        )
        .unwrap();
        assert_eq!(names(&explicit), ["runtime"]);
    }

    #[test]
    fn self_reference_substitutes_the_matched_hierarchy_entry() {
        // `test` extends `runtime` extends `compile`; the rule matches the
        // `runtime` hierarchy entry, so `@` resolves to `runtime` while `#`
        // resolves to the originally requested `test`.
        let producer = ComponentMetadata::new(ComponentId::new("org.example", "widgets", "2.0"))
            .with_configuration(Configuration::new("test", true, &[]))
            .with_configuration(Configuration::new("runtime", true, &[]))
            .with_configuration(Configuration::new("compile", true, &[]));
        let from = Configuration::new("test", true, &["runtime", "compile"]);

        let self_ref = select_configurations(
            &descriptor("runtime->@"),
            &consumer_id(),
            &from,
            &producer,
        )
        .unwrap();
        assert_eq!(names(&self_ref), ["runtime"]);

        let from_ref = select_configurations(
            &descriptor("runtime->#"),
            &consumer_id(),
            &from,
            &producer,
        )
        .unwrap();
        assert_eq!(names(&from_ref), ["test"]);
    }

    #[test]
    fn unresolvable_pattern_carries_the_offending_name() {
        let descriptor = descriptor("compile->provided");
        let from = Configuration::new("compile", true, &[]);
        let producer = producer();

        let err = select_configurations(&descriptor, &consumer_id(), &from, &producer)
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::ConfigurationNotFound {
                from_component: consumer_id(),
                from_configuration: "compile".to_string(),
                pattern: "provided".to_string(),
                target_component: ComponentId::new("org.example", "widgets", "2.0"),
            }
        );
    }

    #[test]
    fn wildcard_rule_with_self_reference_fails_for_unknown_consumer_configuration() {
        // The consumer's `test` has no explicit rule and no `%` rule exists,
        // so only the `*->@` rule applies; `@` substitutes `test`, which the
        // producer does not declare.
        let descriptor = descriptor("compile->default;*->@");
        let from = Configuration::new("test", true, &[]);
        let producer = ComponentMetadata::new(ComponentId::new("org.example", "widgets", "2.0"))
            .with_configuration(Configuration::new("default", true, &[]))
            .with_configuration(Configuration::new("runtime", true, &[]));

        let err = select_configurations(&descriptor, &consumer_id(), &from, &producer)
            .unwrap_err();
        match err {
            ResolutionError::ConfigurationNotFound { pattern, .. } => {
                assert_eq!(pattern, "test");
            }
        }
    }

    #[test]
    fn no_applicable_rule_yields_an_empty_set() {
        let descriptor = descriptor("compile->default");
        let from = Configuration::new("test", true, &[]);
        let producer = producer();

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn component_resolver_seam_feeds_selection() {
        struct FixedResolver {
            metadata: ComponentMetadata,
        }

        impl ComponentResolver for FixedResolver {
            fn resolve(&self, _selector: &ModuleSelector) -> anyhow::Result<ComponentMetadata> {
                Ok(self.metadata.clone())
            }
        }

        let resolver = FixedResolver {
            metadata: producer(),
        };
        let descriptor = descriptor("compile->default");
        let producer = resolver.resolve(descriptor.selector()).unwrap();
        let from = Configuration::new("compile", true, &[]);

        let targets =
            select_configurations(&descriptor, &consumer_id(), &from, &producer).unwrap();
        assert_eq!(names(&targets), ["default"]);
    }
}
