//! # Tenant Control Plane
//!
//! Resource model for hosted Kubernetes control planes: one `TenantControlPlane`
//! object per tenant, carrying the operator's desired state and the reconciler's
//! observed state.
//!
//! ## Overview
//!
//! 1. **Resource model** - [`crd`] defines the Spec, the Status sub-records and the
//!    generated CustomResourceDefinition
//! 2. **Fencing** - [`convergence`] compares version tokens so a phase re-runs
//!    whenever the artifact it consumed has changed
//! 3. **Readiness** - the overall version status (`Provisioning`, `Upgrading`,
//!    `Ready`, `NotReady`) is derived from the sub-records, never stored by hand
//! 4. **Concurrency** - [`store`] commits mutations against the resource version
//!    that was read, re-reading on conflict
//!
//! Commits and readiness derivations are counted on a Prometheus registry. An
//! embedding reconciler calls [`observability::metrics::register_metrics`] once
//! and serves [`observability::metrics::render`] from its metrics endpoint.
//!
//! ## Usage
//!
//! ```no_run
//! use tenant_control_plane::config::CommitConfig;
//! use tenant_control_plane::store::{refresh_and_commit, KubeStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = kube::Client::try_default().await?;
//! let config = CommitConfig::from_env();
//! let store = KubeStore::new(client, config.field_manager.clone());
//! let (_tcp, readiness) = refresh_and_commit(&store, "tenants", "alpha", &config).await?;
//! println!("{}", readiness.status);
//! # Ok(())
//! # }
//! ```

pub mod conditions;
pub mod config;
pub mod constants;
pub mod convergence;
pub mod crd;
pub mod error;
pub mod observability;
pub mod scheme;
pub mod store;
pub mod validation;

pub use crd::{TenantControlPlane, TenantControlPlaneList, TenantControlPlaneSpec, TenantControlPlaneStatus};
pub use error::{Error, Result};
