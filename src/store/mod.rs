//! # Object Stores
//!
//! Versioned storage of TenantControlPlane objects with optimistic concurrency.
//!
//! Every write carries the `resourceVersion` it was computed from and fails with
//! [`Error::Conflict`](crate::error::Error::Conflict) when the stored object has
//! moved on. Sub-records are never written on their own: status and spec are
//! always committed as a whole.

mod backoff;
mod commit;
mod kube_store;
mod memory;

pub use backoff::FibonacciBackoff;
pub use commit::{commit_spec, commit_status, refresh_and_commit};
pub use kube_store::KubeStore;
pub use memory::InMemoryStore;

use crate::crd::{TenantControlPlane, TenantControlPlaneList};
use crate::error::Result;
use async_trait::async_trait;

/// Read and compare-and-swap access to TenantControlPlane objects
#[async_trait]
pub trait TenantControlPlaneStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<TenantControlPlane>;

    /// List objects in one namespace, or across all namespaces with `None`
    async fn list(&self, namespace: Option<&str>) -> Result<TenantControlPlaneList>;

    /// Write `object.status` if the stored resource version still equals `object`'s
    async fn replace_status(&self, object: &TenantControlPlane) -> Result<TenantControlPlane>;

    /// Write `object.spec` and metadata if the stored resource version still equals `object`'s
    async fn replace_spec(&self, object: &TenantControlPlane) -> Result<TenantControlPlane>;
}
