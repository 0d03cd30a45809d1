//! # Constants
//!
//! API identity, well-known keys and configuration defaults shared across the crate.

/// API group of the TenantControlPlane resource
pub const API_GROUP: &str = "kamaji.clastix.io";

/// API version of the TenantControlPlane resource
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified `apiVersion` value (`group/version`)
pub const API_GROUP_VERSION: &str = "kamaji.clastix.io/v1alpha1";

/// Kind of the root resource
pub const KIND: &str = "TenantControlPlane";

/// Kind of the companion list resource
pub const LIST_KIND: &str = "TenantControlPlaneList";

/// Finalizer guarding release of tenant-owned artifacts on deletion
pub const FINALIZER: &str = "kamaji.clastix.io/finalizer";

/// Label carrying the owning tenant name on generated resources
pub const LABEL_TENANT_NAME: &str = "kamaji.clastix.io/name";

/// Label identifying the managing component on generated resources
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`]
pub const LABEL_MANAGED_BY_VALUE: &str = "tenant-control-plane";

// Spec defaults
pub const DEFAULT_REPLICAS: i32 = 2;
pub const DEFAULT_API_SERVER_PORT: i32 = 6443;

// Commit retry defaults
pub const DEFAULT_COMMIT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_COMMIT_BACKOFF_MIN_MS: u64 = 50;
pub const DEFAULT_COMMIT_BACKOFF_MAX_MS: u64 = 2000;
pub const DEFAULT_FIELD_MANAGER: &str = "tenant-control-plane";
