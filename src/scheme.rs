//! # Scheme
//!
//! Explicit registry of the types a caller can encode and decode.
//!
//! A [`Scheme`] is built by the caller and passed to whoever (de)serializes
//! objects; there is no process-wide type table. Payloads are checked against
//! the registry by `apiVersion`/`kind` before being decoded into a typed value.

use crate::constants::{API_GROUP_VERSION, KIND, LIST_KIND};
use crate::crd::{TenantControlPlane, TenantControlPlaneList};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A type that can be registered in a [`Scheme`]
pub trait SchemeKind: Serialize + DeserializeOwned {
    const API_VERSION: &'static str;
    const KIND: &'static str;

    fn group_version_kind() -> GroupVersionKind {
        GroupVersionKind::new(Self::API_VERSION, Self::KIND)
    }
}

impl SchemeKind for TenantControlPlane {
    const API_VERSION: &'static str = API_GROUP_VERSION;
    const KIND: &'static str = KIND;
}

impl SchemeKind for TenantControlPlaneList {
    const API_VERSION: &'static str = API_GROUP_VERSION;
    const KIND: &'static str = LIST_KIND;
}

/// `apiVersion` + `kind` pair identifying a registered type
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupVersionKind {
    pub api_version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version, self.kind)
    }
}

/// Serialization format of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeMetaHeader {
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Registry of known types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scheme {
    kinds: BTreeSet<GroupVersionKind>,
}

/// Builder for [`Scheme`]
#[derive(Debug, Clone, Default)]
pub struct SchemeBuilder {
    kinds: BTreeSet<GroupVersionKind>,
}

impl SchemeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register<K: SchemeKind>(mut self) -> Self {
        self.kinds.insert(K::group_version_kind());
        self
    }

    pub fn build(self) -> Scheme {
        Scheme { kinds: self.kinds }
    }
}

/// Register the TenantControlPlane kinds (object and list)
#[must_use]
pub fn add_to_scheme(builder: SchemeBuilder) -> SchemeBuilder {
    builder
        .register::<TenantControlPlane>()
        .register::<TenantControlPlaneList>()
}

impl Scheme {
    pub fn builder() -> SchemeBuilder {
        SchemeBuilder::new()
    }

    pub fn recognizes(&self, api_version: &str, kind: &str) -> bool {
        self.kinds
            .iter()
            .any(|gvk| gvk.api_version == api_version && gvk.kind == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.kinds.iter()
    }

    /// Identify the registered type of a JSON or YAML payload
    pub fn kind_of(&self, payload: &str) -> Result<GroupVersionKind> {
        // YAML is a superset of JSON, one parser covers both
        let header: TypeMetaHeader = serde_yaml::from_str(payload)?;
        let (Some(api_version), Some(kind)) = (header.api_version, header.kind) else {
            return Err(Error::MissingTypeMeta);
        };
        if api_version.is_empty() || kind.is_empty() {
            return Err(Error::MissingTypeMeta);
        }
        if !self.recognizes(&api_version, &kind) {
            return Err(Error::UnregisteredKind { api_version, kind });
        }
        Ok(GroupVersionKind::new(api_version, kind))
    }

    /// Decode a JSON or YAML payload into `K`, which must be registered and match the payload
    pub fn decode<K: SchemeKind>(&self, payload: &str) -> Result<K> {
        self.ensure_registered::<K>()?;
        let found = self.kind_of(payload)?;
        let expected = K::group_version_kind();
        if found != expected {
            return Err(Error::KindMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(serde_yaml::from_str(payload)?)
    }

    pub fn encode<K: SchemeKind>(&self, object: &K, format: Format) -> Result<String> {
        self.ensure_registered::<K>()?;
        match format {
            Format::Json => Ok(serde_json::to_string_pretty(object)?),
            Format::Yaml => Ok(serde_yaml::to_string(object)?),
        }
    }

    fn ensure_registered<K: SchemeKind>(&self) -> Result<()> {
        if self.recognizes(K::API_VERSION, K::KIND) {
            Ok(())
        } else {
            Err(Error::UnregisteredKind {
                api_version: K::API_VERSION.to_string(),
                kind: K::KIND.to_string(),
            })
        }
    }
}
