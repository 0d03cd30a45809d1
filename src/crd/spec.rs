//! # TenantControlPlane Spec
//!
//! Desired-state types owned by operators: control plane placement, Kubernetes
//! configuration, network profile and add-ons.

use crate::constants::{DEFAULT_API_SERVER_PORT, DEFAULT_REPLICAS};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How the tenant control plane workloads are created in the host cluster
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlane {
    /// Options for the control plane Deployment
    #[serde(default)]
    pub deployment: DeploymentSpec,
    /// Options for the Service exposing the API server
    pub service: ServiceSpec,
    /// Optional Ingress exposing the API server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<IngressSpec>,
}

/// Deployment options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Number of control plane replicas
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    #[serde(default, skip_serializing_if = "AdditionalMetadata::is_empty")]
    pub additional_metadata: AdditionalMetadata,
}

impl Default for DeploymentSpec {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            additional_metadata: AdditionalMetadata::default(),
        }
    }
}

/// Service options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "AdditionalMetadata::is_empty")]
    pub additional_metadata: AdditionalMetadata,
    /// How the API server is exposed
    pub service_type: ServiceType,
}

/// Service exposure type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum ServiceType {
    ClusterIP,
    NodePort,
    LoadBalancer,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceType::ClusterIP => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
        };
        f.write_str(name)
    }
}

/// Ingress options
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(default, skip_serializing_if = "AdditionalMetadata::is_empty")]
    pub additional_metadata: AdditionalMetadata,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,
    /// Ingress host override. Defaults to `<tenant>.<namespace>.<domain>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Labels and annotations overlaid onto generated resources
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct AdditionalMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl AdditionalMetadata {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.annotations.is_empty()
    }

    /// Merge onto generated metadata. Entries declared here win on key collisions.
    pub fn overlay_onto(&self, metadata: &mut ObjectMeta) {
        if !self.labels.is_empty() {
            metadata
                .labels
                .get_or_insert_with(BTreeMap::new)
                .extend(self.labels.clone());
        }
        if !self.annotations.is_empty() {
            metadata
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .extend(self.annotations.clone());
        }
    }
}

/// Kubernetes configuration of the tenant control plane
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesSpec {
    /// Desired Kubernetes version (e.g. "v1.30.2")
    pub version: String,
    #[serde(default)]
    pub kubelet: KubeletSpec,
    /// Enabled admission controllers
    #[serde(default)]
    pub admission_controllers: AdmissionControllers,
}

/// Kubelet options
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct KubeletSpec {
    /// Cgroup driver for the kubelet
    #[serde(default, rename = "cgroupfs", skip_serializing_if = "Option::is_none")]
    pub cgroup_driver: Option<CGroupDriver>,
}

/// Kubelet cgroup driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CGroupDriver {
    Systemd,
    Cgroupfs,
}

/// Admission plugins known to the API server.
///
/// Variants are declared alphabetically so the derived `Ord` yields a stable,
/// name-sorted plugin list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, JsonSchema,
)]
pub enum AdmissionController {
    AlwaysAdmit,
    AlwaysDeny,
    AlwaysPullImages,
    CertificateApproval,
    CertificateSigning,
    CertificateSubjectRestriction,
    DefaultIngressClass,
    DefaultStorageClass,
    DefaultTolerationSeconds,
    DenyServiceExternalIPs,
    EventRateLimit,
    ExtendedResourceToleration,
    ImagePolicyWebhook,
    LimitPodHardAntiAffinityTopology,
    LimitRanger,
    MutatingAdmissionWebhook,
    NamespaceAutoProvision,
    NamespaceExists,
    NamespaceLifecycle,
    NodeRestriction,
    OwnerReferencesPermissionEnforcement,
    PersistentVolumeClaimResize,
    PodNodeSelector,
    PodSecurity,
    PodTolerationRestriction,
    Priority,
    ResourceQuota,
    RuntimeClass,
    ServiceAccount,
    StorageObjectInUseProtection,
    TaintNodesByCondition,
    ValidatingAdmissionPolicy,
    ValidatingAdmissionWebhook,
}

impl AdmissionController {
    pub const ALL: [AdmissionController; 33] = [
        AdmissionController::AlwaysAdmit,
        AdmissionController::AlwaysDeny,
        AdmissionController::AlwaysPullImages,
        AdmissionController::CertificateApproval,
        AdmissionController::CertificateSigning,
        AdmissionController::CertificateSubjectRestriction,
        AdmissionController::DefaultIngressClass,
        AdmissionController::DefaultStorageClass,
        AdmissionController::DefaultTolerationSeconds,
        AdmissionController::DenyServiceExternalIPs,
        AdmissionController::EventRateLimit,
        AdmissionController::ExtendedResourceToleration,
        AdmissionController::ImagePolicyWebhook,
        AdmissionController::LimitPodHardAntiAffinityTopology,
        AdmissionController::LimitRanger,
        AdmissionController::MutatingAdmissionWebhook,
        AdmissionController::NamespaceAutoProvision,
        AdmissionController::NamespaceExists,
        AdmissionController::NamespaceLifecycle,
        AdmissionController::NodeRestriction,
        AdmissionController::OwnerReferencesPermissionEnforcement,
        AdmissionController::PersistentVolumeClaimResize,
        AdmissionController::PodNodeSelector,
        AdmissionController::PodSecurity,
        AdmissionController::PodTolerationRestriction,
        AdmissionController::Priority,
        AdmissionController::ResourceQuota,
        AdmissionController::RuntimeClass,
        AdmissionController::ServiceAccount,
        AdmissionController::StorageObjectInUseProtection,
        AdmissionController::TaintNodesByCondition,
        AdmissionController::ValidatingAdmissionPolicy,
        AdmissionController::ValidatingAdmissionWebhook,
    ];

    /// Plugins enabled when the spec does not list any
    pub const DEFAULTS: [AdmissionController; 17] = [
        AdmissionController::CertificateApproval,
        AdmissionController::CertificateSigning,
        AdmissionController::CertificateSubjectRestriction,
        AdmissionController::DefaultIngressClass,
        AdmissionController::DefaultStorageClass,
        AdmissionController::DefaultTolerationSeconds,
        AdmissionController::LimitRanger,
        AdmissionController::MutatingAdmissionWebhook,
        AdmissionController::NamespaceLifecycle,
        AdmissionController::PersistentVolumeClaimResize,
        AdmissionController::Priority,
        AdmissionController::ResourceQuota,
        AdmissionController::RuntimeClass,
        AdmissionController::ServiceAccount,
        AdmissionController::StorageObjectInUseProtection,
        AdmissionController::TaintNodesByCondition,
        AdmissionController::ValidatingAdmissionWebhook,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AdmissionController::AlwaysAdmit => "AlwaysAdmit",
            AdmissionController::AlwaysDeny => "AlwaysDeny",
            AdmissionController::AlwaysPullImages => "AlwaysPullImages",
            AdmissionController::CertificateApproval => "CertificateApproval",
            AdmissionController::CertificateSigning => "CertificateSigning",
            AdmissionController::CertificateSubjectRestriction => "CertificateSubjectRestriction",
            AdmissionController::DefaultIngressClass => "DefaultIngressClass",
            AdmissionController::DefaultStorageClass => "DefaultStorageClass",
            AdmissionController::DefaultTolerationSeconds => "DefaultTolerationSeconds",
            AdmissionController::DenyServiceExternalIPs => "DenyServiceExternalIPs",
            AdmissionController::EventRateLimit => "EventRateLimit",
            AdmissionController::ExtendedResourceToleration => "ExtendedResourceToleration",
            AdmissionController::ImagePolicyWebhook => "ImagePolicyWebhook",
            AdmissionController::LimitPodHardAntiAffinityTopology => {
                "LimitPodHardAntiAffinityTopology"
            }
            AdmissionController::LimitRanger => "LimitRanger",
            AdmissionController::MutatingAdmissionWebhook => "MutatingAdmissionWebhook",
            AdmissionController::NamespaceAutoProvision => "NamespaceAutoProvision",
            AdmissionController::NamespaceExists => "NamespaceExists",
            AdmissionController::NamespaceLifecycle => "NamespaceLifecycle",
            AdmissionController::NodeRestriction => "NodeRestriction",
            AdmissionController::OwnerReferencesPermissionEnforcement => {
                "OwnerReferencesPermissionEnforcement"
            }
            AdmissionController::PersistentVolumeClaimResize => "PersistentVolumeClaimResize",
            AdmissionController::PodNodeSelector => "PodNodeSelector",
            AdmissionController::PodSecurity => "PodSecurity",
            AdmissionController::PodTolerationRestriction => "PodTolerationRestriction",
            AdmissionController::Priority => "Priority",
            AdmissionController::ResourceQuota => "ResourceQuota",
            AdmissionController::RuntimeClass => "RuntimeClass",
            AdmissionController::ServiceAccount => "ServiceAccount",
            AdmissionController::StorageObjectInUseProtection => "StorageObjectInUseProtection",
            AdmissionController::TaintNodesByCondition => "TaintNodesByCondition",
            AdmissionController::ValidatingAdmissionPolicy => "ValidatingAdmissionPolicy",
            AdmissionController::ValidatingAdmissionWebhook => "ValidatingAdmissionWebhook",
        }
    }
}

impl fmt::Display for AdmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of enabled admission plugins. Insertion order is irrelevant; iteration is name-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AdmissionControllers(BTreeSet<AdmissionController>);

impl AdmissionControllers {
    pub fn new(plugins: impl IntoIterator<Item = AdmissionController>) -> Self {
        Self(plugins.into_iter().collect())
    }

    pub fn contains(&self, plugin: AdmissionController) -> bool {
        self.0.contains(&plugin)
    }

    pub fn iter(&self) -> impl Iterator<Item = AdmissionController> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the API server `--enable-admission-plugins` flag
    pub fn to_flag_value(&self) -> String {
        self.iter()
            .map(AdmissionController::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for AdmissionControllers {
    fn default() -> Self {
        Self::new(AdmissionController::DEFAULTS)
    }
}

impl JsonSchema for AdmissionControllers {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("AdmissionControllers")
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        // Kubernetes rejects uniqueItems in structural schemas; use a list-type set instead
        let names: Vec<&str> = AdmissionController::ALL
            .iter()
            .map(|plugin| plugin.as_str())
            .collect();
        schemars::json_schema!({
            "type": "array",
            "items": { "type": "string", "enum": names },
            "x-kubernetes-list-type": "set",
            "description": "Enabled admission controllers of the tenant API server"
        })
    }
}

/// Network profile of the tenant control plane
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfileSpec {
    /// Address where the API server is exposed.
    /// May be empty for LoadBalancer services to use the cloud-assigned address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Also publish the address as an external IP (ClusterIP/NodePort services only)
    #[serde(default, rename = "allowAddressAsExternalIP")]
    pub allow_address_as_external_ip: bool,
    /// Port where the API server is exposed
    #[serde(default = "default_port")]
    pub port: i32,
    /// DNS domain of the tenant cluster
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub service_cidr: String,
    #[serde(default)]
    pub pod_cidr: String,
    /// DNS service IPs; order is preserved for deterministic config generation
    #[serde(default, rename = "dnsServiceIPs")]
    pub dns_service_ips: Vec<String>,
}

impl Default for NetworkProfileSpec {
    fn default() -> Self {
        Self {
            address: None,
            allow_address_as_external_ip: false,
            port: default_port(),
            domain: String::new(),
            service_cidr: String::new(),
            pod_cidr: String::new(),
            dns_service_ips: Vec::new(),
        }
    }
}

impl NetworkProfileSpec {
    /// Configured address, ignoring empty strings
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().filter(|address| !address.is_empty())
    }
}

/// Add-on toggle
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct AddonSpec {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AddonSpec {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Enabled add-ons
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonsSpec {
    #[serde(default, rename = "coreDNS")]
    pub core_dns: AddonSpec,
    #[serde(default)]
    pub kube_proxy: AddonSpec,
}

fn default_replicas() -> i32 {
    DEFAULT_REPLICAS
}

fn default_port() -> i32 {
    DEFAULT_API_SERVER_PORT
}

fn default_true() -> bool {
    true
}
