//! # Version Tokens
//!
//! Opaque markers of an artifact's content generation.
//!
//! A token is only ever compared for equality against another token of the
//! *same* artifact. Ordering between tokens of different artifacts is meaningless,
//! so `VersionToken` deliberately implements neither `Ord` nor `PartialOrd`.

use kube::{Resource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque, per-artifact version marker (typically a Kubernetes `resourceVersion`)
///
/// An empty string is never a valid token: it is represented as `None` wherever
/// a token is optional, meaning "not yet executed".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Build a token, returning `None` for the empty string
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Current token of a stored Kubernetes object (its `resourceVersion`)
    pub fn of<K: Resource>(object: &K) -> Option<Self> {
        object.resource_version().and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relationship between a consumed token and the current token of its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The record has never consumed any version of its input
    NeverExecuted,
    /// The record consumed an older (or otherwise different) version
    Stale,
    /// The record consumed exactly the current version
    Fresh,
}

impl Freshness {
    /// Compare what a record consumed with what its input currently is
    pub fn of(consumed: Option<&VersionToken>, current: &VersionToken) -> Self {
        match consumed {
            None => Freshness::NeverExecuted,
            Some(token) if token == current => Freshness::Fresh,
            Some(_) => Freshness::Stale,
        }
    }

    pub fn is_stale(self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

/// Deserialize an optional token, treating `""` as absent
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<VersionToken>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(VersionToken::new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn token(value: &str) -> VersionToken {
        VersionToken::new(value).unwrap()
    }

    #[test]
    fn test_empty_token_is_absent() {
        assert!(VersionToken::new("").is_none());
        assert_eq!(token("42").as_str(), "42");
    }

    #[test]
    fn test_freshness() {
        let current = token("7");
        assert_eq!(Freshness::of(None, &current), Freshness::NeverExecuted);
        assert_eq!(Freshness::of(Some(&token("6")), &current), Freshness::Stale);
        assert_eq!(Freshness::of(Some(&token("7")), &current), Freshness::Fresh);
        assert!(Freshness::NeverExecuted.is_stale());
        assert!(Freshness::Stale.is_stale());
        assert!(!Freshness::Fresh.is_stale());
    }

    #[test]
    fn test_token_of_resource() {
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some("alpha-kubeadmconfig".to_string()),
                resource_version: Some("1234".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(VersionToken::of(&config_map), Some(token("1234")));

        let unsaved = ConfigMap::default();
        assert_eq!(VersionToken::of(&unsaved), None);
    }

    #[test]
    fn test_token_serializes_as_plain_string() {
        let json = serde_json::to_string(&token("99")).unwrap();
        assert_eq!(json, "\"99\"");
    }
}
