//! # Kubernetes Resource Snapshots
//!
//! Observed state of the host-cluster objects that run and expose the tenant
//! control plane. Each snapshot composes the upstream status under a named
//! `status` field with the tenant-specific identity fields next to it.

use k8s_openapi::api::apps::v1::DeploymentStatus;
use k8s_openapi::api::core::v1::ServiceStatus;
use k8s_openapi::api::networking::v1::IngressStatus;
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate version status of the control plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum KubernetesVersionStatus {
    #[default]
    Provisioning,
    Upgrading,
    Ready,
    NotReady,
}

impl KubernetesVersionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            KubernetesVersionStatus::Provisioning => "Provisioning",
            KubernetesVersionStatus::Upgrading => "Upgrading",
            KubernetesVersionStatus::Ready => "Ready",
            KubernetesVersionStatus::NotReady => "NotReady",
        }
    }
}

impl fmt::Display for KubernetesVersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running version and its status
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct KubernetesVersion {
    /// Version the control plane last became Ready with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub status: KubernetesVersionStatus,
}

/// Observed control plane Deployment
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct KubernetesDeploymentStatus {
    pub name: String,
    pub namespace: String,
    /// Kubernetes version of the pod template last applied to the Deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    #[schemars(schema_with = "preserved_object")]
    pub status: DeploymentStatus,
}

impl KubernetesDeploymentStatus {
    pub fn available_replicas(&self) -> i32 {
        self.status.available_replicas.unwrap_or(0)
    }

    pub fn updated_replicas(&self) -> i32 {
        self.status.updated_replicas.unwrap_or(0)
    }

    /// Desired replicas are available and running the current pod template
    pub fn has_rolled_out(&self, desired: i32) -> bool {
        self.available_replicas() >= desired && self.updated_replicas() >= desired
    }

    /// The applied template carries `version` and has fully rolled out
    pub fn is_current(&self, version: &str, desired: i32) -> bool {
        self.version.as_deref() == Some(version) && self.has_rolled_out(desired)
    }
}

/// Observed Service exposing the API server
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct KubernetesServiceStatus {
    pub name: String,
    pub namespace: String,
    /// Live port of the API server on the Service
    pub port: i32,
    #[serde(default)]
    #[schemars(schema_with = "preserved_object")]
    pub status: ServiceStatus,
}

impl KubernetesServiceStatus {
    /// First address assigned by a load balancer, IP preferred over hostname
    pub fn load_balancer_address(&self) -> Option<&str> {
        self.status
            .load_balancer
            .as_ref()
            .and_then(|lb| lb.ingress.as_ref())
            .into_iter()
            .flatten()
            .find_map(|ingress| {
                ingress
                    .ip
                    .as_deref()
                    .filter(|ip| !ip.is_empty())
                    .or_else(|| ingress.hostname.as_deref().filter(|host| !host.is_empty()))
            })
    }
}

/// Observed Ingress exposing the API server
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct KubernetesIngressStatus {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    #[schemars(schema_with = "preserved_object")]
    pub status: IngressStatus,
}

/// Kubernetes resources backing the tenant control plane
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct KubernetesResourcesStatus {
    #[serde(default)]
    pub version: KubernetesVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<KubernetesDeploymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<KubernetesServiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<KubernetesIngressStatus>,
}

/// Upstream status payloads are validated by their own API; keep them opaque in the CRD schema
fn preserved_object(_gen: &mut SchemaGenerator) -> Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus};

    #[test]
    fn test_version_status_defaults_to_provisioning() {
        let version: KubernetesVersion = serde_json::from_str("{}").unwrap();
        assert_eq!(version.status, KubernetesVersionStatus::Provisioning);
        assert!(version.version.is_none());
    }

    #[test]
    fn test_deployment_rollout() {
        let deployment = KubernetesDeploymentStatus {
            name: "alpha".to_string(),
            namespace: "tenants".to_string(),
            version: Some("v1.30.2".to_string()),
            status: DeploymentStatus {
                available_replicas: Some(2),
                updated_replicas: Some(1),
                ..Default::default()
            },
        };
        assert_eq!(deployment.available_replicas(), 2);
        assert!(!deployment.has_rolled_out(2));
        assert!(deployment.has_rolled_out(1));
        assert!(deployment.is_current("v1.30.2", 1));
    }

    #[test]
    fn test_rolled_out_template_of_other_version_is_not_current() {
        let mut deployment = KubernetesDeploymentStatus {
            name: "alpha".to_string(),
            namespace: "tenants".to_string(),
            version: Some("v1.30.2".to_string()),
            status: DeploymentStatus {
                available_replicas: Some(2),
                updated_replicas: Some(2),
                ..Default::default()
            },
        };
        assert!(!deployment.is_current("v1.31.0", 2));

        deployment.version = None;
        assert!(!deployment.is_current("v1.30.2", 2));
    }

    #[test]
    fn test_load_balancer_address_prefers_ip() {
        let service = KubernetesServiceStatus {
            name: "alpha".to_string(),
            namespace: "tenants".to_string(),
            port: 6443,
            status: ServiceStatus {
                load_balancer: Some(LoadBalancerStatus {
                    ingress: Some(vec![
                        LoadBalancerIngress {
                            hostname: Some("lb.example.com".to_string()),
                            ip: Some("203.0.113.7".to_string()),
                            ..Default::default()
                        },
                    ]),
                }),
                ..Default::default()
            },
        };
        assert_eq!(service.load_balancer_address(), Some("203.0.113.7"));
    }

    #[test]
    fn test_load_balancer_address_absent() {
        let service = KubernetesServiceStatus::default();
        assert_eq!(service.load_balancer_address(), None);
    }

    #[test]
    fn test_upstream_status_nested_under_named_field() {
        let deployment = KubernetesDeploymentStatus {
            name: "alpha".to_string(),
            namespace: "tenants".to_string(),
            version: None,
            status: DeploymentStatus {
                ready_replicas: Some(2),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&deployment).unwrap();
        assert_eq!(json["status"]["readyReplicas"], 2);
        assert!(json.get("readyReplicas").is_none());
    }
}
