use std::{
    fmt::{Display, Write},
    str::FromStr,
};

use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};

use crate::model::ParseError;

/// A single target pattern of a configuration mapping rule, parsed once
/// from its declared string form.
///
/// The grammar is the closed set inherited from the legacy descriptor
/// format: a plain configuration name, `*`, `@`, `#`, or the fallback form
/// `preferred(fallback)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum TargetPattern {
    /// `preferred(fallback)`: use `preferred` when the target component
    /// declares it, otherwise resolve `fallback` instead. The fallback side
    /// is never itself a fallback form.
    Fallback {
        preferred: String,
        fallback: Box<TargetPattern>,
    },
    /// `*`: every visible configuration of the target component.
    Wildcard,
    /// `@`: the consumer hierarchy entry that matched the mapping rule.
    SelfRef,
    /// `#`: the originally requested consumer configuration.
    FromRef,
    /// An exact configuration name.
    Plain { name: String },
}

impl TargetPattern {
    pub fn plain(name: impl Into<String>) -> TargetPattern {
        TargetPattern::Plain { name: name.into() }
    }

    pub fn fallback(preferred: impl Into<String>, fallback: TargetPattern) -> TargetPattern {
        TargetPattern::Fallback {
            preferred: preferred.into(),
            fallback: Box::new(fallback),
        }
    }

    // The fallback side and the top level share this set; fallback syntax
    // does not nest, so a stray `(` here is part of the name.
    fn parse_simple(s: &str) -> TargetPattern {
        match s {
            "*" => TargetPattern::Wildcard,
            "@" => TargetPattern::SelfRef,
            "#" => TargetPattern::FromRef,
            name => TargetPattern::plain(name),
        }
    }
}

impl FromStr for TargetPattern {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::EmptyPattern(s.to_string()));
        }
        match s.find('(') {
            // A `(` without a trailing `)` is not fallback syntax; the
            // whole string is treated as a literal name, as the legacy
            // format did.
            Some(open) if s.ends_with(')') => Ok(TargetPattern::Fallback {
                preferred: s[..open].to_string(),
                fallback: Box::new(Self::parse_simple(&s[open + 1..s.len() - 1])),
            }),
            _ => Ok(Self::parse_simple(s)),
        }
    }
}

impl Display for TargetPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetPattern::Fallback {
                preferred,
                fallback,
            } => write!(f, "{}({})", preferred, fallback),
            TargetPattern::Wildcard => f.write_char('*'),
            TargetPattern::SelfRef => f.write_char('@'),
            TargetPattern::FromRef => f.write_char('#'),
            TargetPattern::Plain { name } => f.write_str(name),
        }
    }
}

impl Serialize for TargetPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TargetPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TargetPatternVisitor;

        impl<'de> Visitor<'de> for TargetPatternVisitor {
            type Value = TargetPattern;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a target pattern string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(TargetPatternVisitor)
    }
}
