//! # Error Types
//!
//! Errors raised by the resource model, the fencing utilities and the object stores.
//!
//! Errors are classified as transient (retry on the next observation or after a
//! re-read) or permanent (surface to the operator). Nothing here is fatal to the
//! process; see [`Error::is_transient`].

use crate::convergence::UnmetDependency;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by this crate
#[derive(Debug, Error)]
pub enum Error {
    /// A phase input artifact is absent or has no version token yet
    #[error(transparent)]
    UnmetDependency(#[from] UnmetDependency),

    /// The root object's resource version changed between read and commit
    #[error("write conflict on TenantControlPlane {namespace}/{name}: resource version {resource_version} is stale")]
    Conflict {
        namespace: String,
        name: String,
        resource_version: String,
    },

    /// The object does not exist in the store
    #[error("TenantControlPlane {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    /// Every commit attempt hit a write conflict
    #[error("gave up committing TenantControlPlane {namespace}/{name} after {attempts} conflicting attempts")]
    RetriesExhausted {
        namespace: String,
        name: String,
        attempts: u32,
    },

    /// The desired state cannot be reconciled as written (irrecoverable drift)
    #[error("invalid TenantControlPlane spec: {0}")]
    InvalidSpec(String),

    /// A commit was attempted with an object that was never read from a store
    #[error("TenantControlPlane {namespace}/{name} has no resource version; read it before committing")]
    MissingResourceVersion { namespace: String, name: String },

    /// The payload names a type the scheme does not know
    #[error("kind {kind} in {api_version} is not registered in the scheme")]
    UnregisteredKind { api_version: String, kind: String },

    /// The payload names a registered type other than the requested one
    #[error("expected {expected}, found {found}")]
    KindMismatch { expected: String, found: String },

    /// The payload carries no apiVersion/kind
    #[error("payload is missing apiVersion or kind")]
    MissingTypeMeta,

    /// In-memory store lock was poisoned by a panicking writer
    #[error("store lock poisoned: {0}")]
    Lock(String),

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// JSON (de)serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether retrying (after re-reading the object) can succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::UnmetDependency(_)
            | Error::Conflict { .. }
            | Error::RetriesExhausted { .. }
            | Error::Kube(_) => true,
            Error::NotFound { .. }
            | Error::InvalidSpec(_)
            | Error::MissingResourceVersion { .. }
            | Error::UnregisteredKind { .. }
            | Error::KindMismatch { .. }
            | Error::MissingTypeMeta
            | Error::Lock(_)
            | Error::Json(_)
            | Error::Yaml(_) => false,
        }
    }

    /// Whether this is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
