//! Shared fixtures for the integration tests

#![allow(dead_code, reason = "each test binary uses a different subset of the fixtures")]

use chrono::{DateTime, TimeZone, Utc};
use k8s_openapi::api::apps::v1::DeploymentStatus;
use tenant_control_plane::convergence::VersionToken;
use tenant_control_plane::crd::{
    Addon, BootstrapPhase, KubernetesDeploymentStatus, TenantControlPlane, TenantControlPlaneSpec,
    TenantControlPlaneStatus,
};

pub const NAMESPACE: &str = "tenants";
pub const NAME: &str = "alpha";
pub const VERSION: &str = "v1.30.2";

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 9, minute, 0).unwrap()
}

pub fn token(value: &str) -> VersionToken {
    VersionToken::new(value).unwrap()
}

/// Valid LoadBalancer tenant with default add-ons and an empty status
pub fn tenant() -> TenantControlPlane {
    let spec: TenantControlPlaneSpec = serde_json::from_value(serde_json::json!({
        "controlPlane": { "service": { "serviceType": "LoadBalancer" } },
        "kubernetes": { "version": VERSION },
        "networkProfile": {
            "serviceCidr": "10.96.0.0/16",
            "podCidr": "10.244.0.0/16",
            "dnsServiceIPs": ["10.96.0.10"]
        }
    }))
    .unwrap();
    let mut tcp = TenantControlPlane::new(NAME, spec);
    tcp.metadata.namespace = Some(NAMESPACE.to_string());
    tcp
}

/// Deployment whose applied template runs `version`
pub fn deployment_of(version: &str, available: i32, updated: i32) -> KubernetesDeploymentStatus {
    KubernetesDeploymentStatus {
        version: Some(version.to_string()),
        ..deployment(available, updated)
    }
}

pub fn deployment(available: i32, updated: i32) -> KubernetesDeploymentStatus {
    KubernetesDeploymentStatus {
        name: NAME.to_string(),
        namespace: NAMESPACE.to_string(),
        version: Some(VERSION.to_string()),
        status: DeploymentStatus {
            available_replicas: Some(available),
            updated_replicas: Some(updated),
            replicas: Some(available.max(updated)),
            ..Default::default()
        },
    }
}

/// Status where every phase consumed `config_token` and two replicas are available
pub fn converged(config_token: &str) -> TenantControlPlaneStatus {
    let now = at(0);
    let mut status = TenantControlPlaneStatus::default();
    for (record, secret) in [
        (&mut status.certificates.ca, "alpha-ca"),
        (&mut status.certificates.api_server, "alpha-api-server-certificate"),
        (
            &mut status.certificates.api_server_kubelet_client,
            "alpha-api-server-kubelet-client-certificate",
        ),
        (&mut status.certificates.front_proxy_ca, "alpha-front-proxy-ca"),
        (
            &mut status.certificates.front_proxy_client,
            "alpha-front-proxy-client-certificate",
        ),
        (&mut status.certificates.sa, "alpha-sa-certificate"),
        (&mut status.kubeconfigs.admin, "alpha-admin-kubeconfig"),
        (
            &mut status.kubeconfigs.controller_manager,
            "alpha-controller-manager-kubeconfig",
        ),
        (&mut status.kubeconfigs.scheduler, "alpha-scheduler-kubeconfig"),
    ] {
        record.record_success(secret, now);
    }
    status
        .bootstrap_config
        .record_success("alpha-kubeadmconfig", token(config_token), now);
    for phase in BootstrapPhase::ALL {
        status
            .bootstrap_phases
            .get_mut(phase)
            .record_success(token(config_token), now);
    }
    for addon in Addon::ALL {
        status
            .addons
            .get_mut(addon)
            .record_success(token(config_token), now);
    }
    status.kubernetes_resources.deployment = Some(deployment(2, 2));
    status
}
