//! Print the TenantControlPlane CustomResourceDefinition as YAML
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/tenantcontrolplane.yaml
//! ```

use kube::CustomResourceExt;
use tenant_control_plane::crd::TenantControlPlane;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&TenantControlPlane::crd())?);
    Ok(())
}
