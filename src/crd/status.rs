//! # TenantControlPlane Status
//!
//! Observed state, organized as independent groups so each subsystem converges
//! on its own. Written by the reconciler only, always as a whole object under
//! optimistic concurrency.

use super::records::{
    AddonRecord, BootstrapConfigRecord, BootstrapPhaseRecord, CertificateRecord, KubeconfigRecord,
};
use super::resources::KubernetesResourcesStatus;
use crate::conditions::Condition;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the TenantControlPlane resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantControlPlaneStatus {
    /// Storage backend identity assigned to the tenant
    #[serde(default)]
    pub storage: StorageStatus,
    /// Certificates and key pairs of the control plane
    #[serde(default)]
    pub certificates: CertificatesStatus,
    /// Kubeconfigs of the control plane components
    #[serde(default, rename = "kubeconfig")]
    pub kubeconfigs: KubeconfigsStatus,
    /// Generated kubeadm configuration
    #[serde(default, rename = "kubeadmconfig")]
    pub bootstrap_config: BootstrapConfigRecord,
    /// kubeadm phases that consumed the bootstrap configuration
    #[serde(default, rename = "kubeadmPhase")]
    pub bootstrap_phases: BootstrapPhasesStatus,
    #[serde(default)]
    pub addons: AddonsStatus,
    /// Host-cluster resources running and exposing the control plane
    #[serde(default)]
    pub kubernetes_resources: KubernetesResourcesStatus,
    /// `host:port` where the tenant API server is reachable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<String>,
    /// Conditions represent the latest available observations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Storage backend status
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct StorageStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd: Option<EtcdStatus>,
}

/// Role and user provisioned in etcd for the tenant
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct EtcdStatus {
    #[serde(default)]
    pub role: EtcdRole,
    #[serde(default)]
    pub user: EtcdUser,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct EtcdRole {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<EtcdPermission>,
    #[serde(default)]
    pub exists: bool,
}

/// Key range permission granted to an etcd role
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtcdPermission {
    /// etcd permission type: 0 read, 1 write, 2 read-write
    #[serde(default, rename = "type")]
    pub permission_type: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub range_end: String,
}

impl EtcdPermission {
    pub const READ: i32 = 0;
    pub const WRITE: i32 = 1;
    pub const READ_WRITE: i32 = 2;
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct EtcdUser {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub exists: bool,
}

/// Certificates and key pairs
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificatesStatus {
    #[serde(default)]
    pub ca: CertificateRecord,
    #[serde(default)]
    pub api_server: CertificateRecord,
    #[serde(default)]
    pub api_server_kubelet_client: CertificateRecord,
    #[serde(default, rename = "frontProxyCA")]
    pub front_proxy_ca: CertificateRecord,
    #[serde(default)]
    pub front_proxy_client: CertificateRecord,
    /// Service account key pair
    #[serde(default)]
    pub sa: CertificateRecord,
    /// Present only when the storage backend runs its own PKI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd: Option<EtcdCertificatesStatus>,
}

/// Storage backend certificates
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtcdCertificatesStatus {
    #[serde(default)]
    pub api_server: CertificateRecord,
    #[serde(default)]
    pub ca: CertificateRecord,
}

impl CertificatesStatus {
    /// Every required record with its wire name; the etcd group is included when present
    pub fn records(&self) -> Vec<(&'static str, &CertificateRecord)> {
        let mut records = vec![
            ("ca", &self.ca),
            ("apiServer", &self.api_server),
            ("apiServerKubeletClient", &self.api_server_kubelet_client),
            ("frontProxyCA", &self.front_proxy_ca),
            ("frontProxyClient", &self.front_proxy_client),
            ("sa", &self.sa),
        ];
        if let Some(etcd) = &self.etcd {
            records.push(("etcd.apiServer", &etcd.api_server));
            records.push(("etcd.ca", &etcd.ca));
        }
        records
    }

    /// Names of records without a location
    pub fn missing(&self) -> Vec<&'static str> {
        self.records()
            .into_iter()
            .filter(|(_, record)| !record.is_populated())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn all_populated(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Kubeconfigs of the control plane components
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct KubeconfigsStatus {
    #[serde(default)]
    pub admin: KubeconfigRecord,
    #[serde(default, rename = "controlerManager")]
    pub controller_manager: KubeconfigRecord,
    #[serde(default)]
    pub scheduler: KubeconfigRecord,
}

impl KubeconfigsStatus {
    pub fn records(&self) -> [(&'static str, &KubeconfigRecord); 3] {
        [
            ("admin", &self.admin),
            ("controlerManager", &self.controller_manager),
            ("scheduler", &self.scheduler),
        ]
    }

    pub fn missing(&self) -> Vec<&'static str> {
        self.records()
            .into_iter()
            .filter(|(_, record)| !record.is_populated())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn all_populated(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Bootstrap phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapPhase {
    UploadConfigKubeadm,
    UploadConfigKubelet,
    BootstrapToken,
}

impl BootstrapPhase {
    pub const ALL: [BootstrapPhase; 3] = [
        BootstrapPhase::UploadConfigKubeadm,
        BootstrapPhase::UploadConfigKubelet,
        BootstrapPhase::BootstrapToken,
    ];
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapPhase::UploadConfigKubeadm => "uploadConfigKubeadm",
            BootstrapPhase::UploadConfigKubelet => "uploadConfigKubelet",
            BootstrapPhase::BootstrapToken => "bootstrapToken",
        };
        f.write_str(name)
    }
}

/// Records of the kubeadm phases
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapPhasesStatus {
    #[serde(default)]
    pub upload_config_kubeadm: BootstrapPhaseRecord,
    #[serde(default)]
    pub upload_config_kubelet: BootstrapPhaseRecord,
    #[serde(default)]
    pub bootstrap_token: BootstrapPhaseRecord,
}

impl BootstrapPhasesStatus {
    pub fn get(&self, phase: BootstrapPhase) -> &BootstrapPhaseRecord {
        match phase {
            BootstrapPhase::UploadConfigKubeadm => &self.upload_config_kubeadm,
            BootstrapPhase::UploadConfigKubelet => &self.upload_config_kubelet,
            BootstrapPhase::BootstrapToken => &self.bootstrap_token,
        }
    }

    pub fn get_mut(&mut self, phase: BootstrapPhase) -> &mut BootstrapPhaseRecord {
        match phase {
            BootstrapPhase::UploadConfigKubeadm => &mut self.upload_config_kubeadm,
            BootstrapPhase::UploadConfigKubelet => &mut self.upload_config_kubelet,
            BootstrapPhase::BootstrapToken => &mut self.bootstrap_token,
        }
    }
}

/// Add-ons installed into the tenant cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addon {
    CoreDns,
    KubeProxy,
}

impl Addon {
    pub const ALL: [Addon; 2] = [Addon::CoreDns, Addon::KubeProxy];
}

impl fmt::Display for Addon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Addon::CoreDns => "coreDNS",
            Addon::KubeProxy => "kubeProxy",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonsStatus {
    #[serde(default, rename = "coreDNS")]
    pub core_dns: AddonRecord,
    #[serde(default)]
    pub kube_proxy: AddonRecord,
}

impl AddonsStatus {
    pub fn get(&self, addon: Addon) -> &AddonRecord {
        match addon {
            Addon::CoreDns => &self.core_dns,
            Addon::KubeProxy => &self.kube_proxy,
        }
    }

    pub fn get_mut(&mut self, addon: Addon) -> &mut AddonRecord {
        match addon {
            Addon::CoreDns => &mut self.core_dns,
            Addon::KubeProxy => &mut self.kube_proxy,
        }
    }
}

/// Kind of host-cluster object holding a tenant artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnedKind {
    Secret,
    ConfigMap,
}

/// A host-cluster object owned by the tenant, released on deletion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnedArtifact {
    pub kind: OwnedKind,
    pub name: String,
}

impl TenantControlPlaneStatus {
    /// True while no sub-record has been populated
    pub fn is_pristine(&self) -> bool {
        let certificates = self.certificates.records();
        let kubeconfigs = self.kubeconfigs.records();
        certificates.iter().all(|(_, record)| !record.is_populated())
            && kubeconfigs.iter().all(|(_, record)| !record.is_populated())
            && self.bootstrap_config.current_token().is_none()
            && BootstrapPhase::ALL
                .iter()
                .all(|phase| self.bootstrap_phases.get(*phase).kubeadm_config_resource_version.is_none())
            && Addon::ALL
                .iter()
                .all(|addon| self.addons.get(*addon).kubeadm_config_resource_version.is_none())
            && self.storage.etcd.is_none()
            && self.kubernetes_resources.deployment.is_none()
            && self.kubernetes_resources.service.is_none()
            && self.kubernetes_resources.ingress.is_none()
    }

    /// Secrets and ConfigMaps recorded in this status
    pub fn owned_artifacts(&self) -> Vec<OwnedArtifact> {
        let secrets = self
            .certificates
            .records()
            .into_iter()
            .chain(self.kubeconfigs.records())
            .filter_map(|(_, record)| record.secret_name())
            .map(|name| OwnedArtifact {
                kind: OwnedKind::Secret,
                name: name.to_string(),
            });

        let config_map = self
            .bootstrap_config
            .configmap_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| OwnedArtifact {
                kind: OwnedKind::ConfigMap,
                name: name.to_string(),
            });

        let mut artifacts: Vec<OwnedArtifact> = secrets.chain(config_map).collect();
        // Different records may share one Secret
        let mut seen = std::collections::HashSet::new();
        artifacts.retain(|artifact| seen.insert(artifact.clone()));
        artifacts
    }

    /// Release every artifact and reset the status.
    ///
    /// The only operation that returns records to empty; used when the tenant is deleted.
    pub fn deprovision(&mut self) -> Vec<OwnedArtifact> {
        let artifacts = self.owned_artifacts();
        *self = TenantControlPlaneStatus::default();
        artifacts
    }
}
