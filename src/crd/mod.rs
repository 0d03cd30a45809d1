//! # Custom Resource Definitions
//!
//! The TenantControlPlane resource: one Spec written by operators and one Status
//! written by the reconciler.

mod records;
mod resources;
mod spec;
mod status;

pub use records::{
    AddonRecord, BootstrapConfigRecord, BootstrapPhaseRecord, CertificateRecord, KubeconfigRecord,
    SecretRecord,
};
pub use resources::{
    KubernetesDeploymentStatus, KubernetesIngressStatus, KubernetesResourcesStatus,
    KubernetesServiceStatus, KubernetesVersion, KubernetesVersionStatus,
};
pub use spec::{
    AddonSpec, AddonsSpec, AdditionalMetadata, AdmissionController, AdmissionControllers,
    CGroupDriver, ControlPlane, DeploymentSpec, IngressSpec, KubeletSpec, KubernetesSpec,
    NetworkProfileSpec, ServiceSpec, ServiceType,
};
pub use status::{
    Addon, AddonsStatus, BootstrapPhase, BootstrapPhasesStatus, CertificatesStatus,
    EtcdCertificatesStatus, EtcdPermission, EtcdRole, EtcdStatus, EtcdUser, KubeconfigsStatus,
    OwnedArtifact, OwnedKind, StorageStatus, TenantControlPlaneStatus,
};

use crate::constants::{API_GROUP_VERSION, FINALIZER, LIST_KIND};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// TenantControlPlane Custom Resource Definition
///
/// A Kubernetes control plane run as workloads in the host cluster for one tenant.
///
/// # Example
///
/// ```yaml
/// apiVersion: kamaji.clastix.io/v1alpha1
/// kind: TenantControlPlane
/// metadata:
///   name: alpha
///   namespace: tenants
/// spec:
///   controlPlane:
///     deployment:
///       replicas: 2
///     service:
///       serviceType: LoadBalancer
///   kubernetes:
///     version: v1.30.2
///     kubelet:
///       cgroupfs: systemd
///   networkProfile:
///     port: 6443
///     domain: cluster.local
///     serviceCidr: 10.96.0.0/16
///     podCidr: 10.244.0.0/16
///     dnsServiceIPs:
///       - 10.96.0.10
/// ```
#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "TenantControlPlane",
    group = "kamaji.clastix.io",
    version = "v1alpha1",
    plural = "tenantcontrolplanes",
    namespaced,
    status = "TenantControlPlaneStatus",
    shortname = "tcp",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".spec.kubernetes.version"}, {"name":"Status", "type":"string", "jsonPath":".status.kubernetesResources.version.status"}, {"name":"Control-Plane-Endpoint", "type":"string", "jsonPath":".status.controlPlaneEndpoint"}, {"name":"Kubeconfig", "type":"string", "jsonPath":".status.kubeconfig.admin.secretName"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TenantControlPlaneSpec {
    /// Placement and exposure of the control plane workloads
    pub control_plane: ControlPlane,
    /// Kubernetes version and component configuration
    pub kubernetes: KubernetesSpec,
    /// Network profile of the tenant cluster
    #[serde(default)]
    pub network_profile: NetworkProfileSpec,
    /// Add-ons installed into the tenant cluster
    #[serde(default)]
    pub addons: AddonsSpec,
}

/// List companion of [`TenantControlPlane`]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantControlPlaneList {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ListMeta,
    #[serde(default)]
    pub items: Vec<TenantControlPlane>,
}

impl TenantControlPlaneList {
    pub fn new(items: Vec<TenantControlPlane>) -> Self {
        Self {
            api_version: API_GROUP_VERSION.to_string(),
            kind: LIST_KIND.to_string(),
            metadata: ListMeta::default(),
            items,
        }
    }
}

impl Default for TenantControlPlaneList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Printer-column view of a TenantControlPlane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub status: KubernetesVersionStatus,
    pub endpoint: Option<String>,
    pub admin_kubeconfig: Option<String>,
}

impl TenantControlPlane {
    pub fn desired_version(&self) -> &str {
        &self.spec.kubernetes.version
    }

    pub fn desired_replicas(&self) -> i32 {
        self.spec.control_plane.deployment.replicas
    }

    /// Observed status, empty when the reconciler has not written one yet
    pub fn observed(&self) -> Cow<'_, TenantControlPlaneStatus> {
        match &self.status {
            Some(status) => Cow::Borrowed(status),
            None => Cow::Owned(TenantControlPlaneStatus::default()),
        }
    }

    /// Host routed to the API server, `<tenant>.<namespace>.<domain>` unless overridden
    pub fn ingress_host(&self) -> Option<String> {
        let ingress = self.spec.control_plane.ingress.as_ref()?;
        if !ingress.enabled {
            return None;
        }
        if let Some(hostname) = ingress.hostname.as_deref().filter(|h| !h.is_empty()) {
            return Some(hostname.to_string());
        }
        let domain = self.spec.network_profile.domain.as_str();
        if domain.is_empty() {
            return None;
        }
        Some(format!(
            "{}.{}.{}",
            self.name_any(),
            self.namespace().unwrap_or_default(),
            domain
        ))
    }

    pub fn summary(&self) -> Summary {
        let status = self.observed();
        Summary {
            namespace: self.namespace().unwrap_or_default(),
            name: self.name_any(),
            version: self.desired_version().to_string(),
            status: status.kubernetes_resources.version.status,
            endpoint: status.control_plane_endpoint.clone(),
            admin_kubeconfig: status.kubeconfigs.admin.secret_name().map(str::to_string),
        }
    }

    pub fn has_finalizer(&self) -> bool {
        self.finalizers().iter().any(|f| f == FINALIZER)
    }

    /// Add the artifact-release finalizer. Returns false when it was already present.
    pub fn ensure_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.finalizers_mut().push(FINALIZER.to_string());
        true
    }

    /// Deletion requested and artifacts still guarded by the finalizer
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> TenantControlPlaneSpec {
        serde_json::from_value(serde_json::json!({
            "controlPlane": {
                "service": { "serviceType": "LoadBalancer" },
                "ingress": { "enabled": true }
            },
            "kubernetes": { "version": "v1.30.2" },
            "networkProfile": {
                "domain": "cluster.local",
                "serviceCidr": "10.96.0.0/16",
                "podCidr": "10.244.0.0/16",
                "dnsServiceIPs": ["10.96.0.10"]
            }
        }))
        .unwrap()
    }

    fn sample() -> TenantControlPlane {
        let mut tcp = TenantControlPlane::new("alpha", sample_spec());
        tcp.metadata.namespace = Some("tenants".to_string());
        tcp
    }

    #[test]
    fn test_spec_defaults() {
        let spec = sample_spec();
        assert_eq!(spec.control_plane.deployment.replicas, 2);
        assert_eq!(spec.network_profile.port, 6443);
        assert_eq!(spec.kubernetes.admission_controllers.len(), 17);
        assert!(spec.addons.core_dns.enabled);
        assert!(spec.addons.kube_proxy.enabled);
    }

    #[test]
    fn test_ingress_host_default_and_override() {
        let mut tcp = sample();
        assert_eq!(
            tcp.ingress_host().as_deref(),
            Some("alpha.tenants.cluster.local")
        );

        if let Some(ingress) = tcp.spec.control_plane.ingress.as_mut() {
            ingress.hostname = Some("api.alpha.example.com".to_string());
        }
        assert_eq!(tcp.ingress_host().as_deref(), Some("api.alpha.example.com"));

        tcp.spec.control_plane.ingress = None;
        assert!(tcp.ingress_host().is_none());
    }

    #[test]
    fn test_summary_columns() {
        let mut tcp = sample();
        let mut status = TenantControlPlaneStatus::default();
        status
            .kubeconfigs
            .admin
            .record_success("alpha-admin-kubeconfig", chrono::Utc::now());
        status.control_plane_endpoint = Some("203.0.113.7:6443".to_string());
        tcp.status = Some(status);

        let summary = tcp.summary();
        assert_eq!(summary.version, "v1.30.2");
        assert_eq!(summary.status, KubernetesVersionStatus::Provisioning);
        assert_eq!(summary.endpoint.as_deref(), Some("203.0.113.7:6443"));
        assert_eq!(summary.admin_kubeconfig.as_deref(), Some("alpha-admin-kubeconfig"));
    }

    #[test]
    fn test_ensure_finalizer_once() {
        let mut tcp = sample();
        assert!(tcp.ensure_finalizer());
        assert!(!tcp.ensure_finalizer());
        assert_eq!(tcp.finalizers().len(), 1);
    }

    #[test]
    fn test_list_type_meta() {
        let list = TenantControlPlaneList::new(vec![sample()]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["apiVersion"], "kamaji.clastix.io/v1alpha1");
        assert_eq!(json["kind"], "TenantControlPlaneList");
        assert_eq!(json["items"].as_array().map(Vec::len), Some(1));
    }
}
