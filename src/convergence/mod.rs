//! # Convergence
//!
//! Pure functions over a TenantControlPlane that tell a reconciler what is
//! done, what is stale and how ready the control plane is. Nothing here talks
//! to the API server.

pub mod endpoint;
pub mod fencing;
pub mod plan;
pub mod readiness;
pub mod refresh;
pub mod token;

pub use endpoint::derive_endpoint;
pub use fencing::{decide, require, Artifact, PhaseDecision, PhaseRecord, UnmetDependency};
pub use plan::{plan, PlannedStep, Step};
pub use readiness::{derive_readiness, Blocker, Readiness};
pub use refresh::refresh;
pub use token::{Freshness, VersionToken};
