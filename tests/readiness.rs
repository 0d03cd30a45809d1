//! # Readiness Scenarios
//!
//! End-to-end readiness derivation over a TenantControlPlane:
//! - fresh tenant provisioning
//! - fully converged tenant
//! - version upgrade in flight, with and without a recorded running version
//! - partially provisioned tenant
//! - bootstrap configuration regenerated under a converged tenant

mod common;

use common::{at, converged, deployment, deployment_of, tenant, token, VERSION};
use tenant_control_plane::conditions::{find_condition, CONDITION_READY};
use tenant_control_plane::convergence::{
    derive_readiness, plan, refresh, Blocker, PhaseDecision, Step,
};
use tenant_control_plane::crd::{Addon, BootstrapPhase, KubernetesVersionStatus};

#[test]
fn test_fresh_tenant_is_provisioning() {
    let tcp = tenant();
    let readiness = derive_readiness(&tcp);

    assert_eq!(readiness.status, KubernetesVersionStatus::Provisioning);
    assert!(readiness.running_version.is_none());
    assert!(!readiness.is_ready());
}

#[test]
fn test_converged_tenant_is_ready() {
    let mut tcp = tenant();
    tcp.status = Some(converged("100"));

    let readiness = refresh(&mut tcp, at(1));
    assert_eq!(readiness.status, KubernetesVersionStatus::Ready);
    assert!(readiness.blockers.is_empty());

    let status = tcp.status.as_ref().unwrap();
    assert_eq!(status.kubernetes_resources.version.version.as_deref(), Some(VERSION));
    assert_eq!(
        status.kubernetes_resources.version.status,
        KubernetesVersionStatus::Ready
    );
    assert!(find_condition(&status.conditions, CONDITION_READY)
        .unwrap()
        .is_true());
    assert!(plan(&tcp)
        .iter()
        .filter(|planned| planned.step != Step::Storage && planned.step != Step::Service)
        .all(|planned| !planned.decision.needs_work()));
}

#[test]
fn test_version_change_is_upgrading() {
    let mut tcp = tenant();
    tcp.status = Some(converged("100"));
    refresh(&mut tcp, at(1));

    tcp.spec.kubernetes.version = "v1.31.0".to_string();
    if let Some(status) = tcp.status.as_mut() {
        status.kubernetes_resources.deployment = Some(deployment_of("v1.31.0", 2, 1));
    }

    let readiness = refresh(&mut tcp, at(2));
    assert_eq!(readiness.status, KubernetesVersionStatus::Upgrading);
    // Running version stays at the last Ready version until the rollout completes
    let status = tcp.status.as_ref().unwrap();
    assert_eq!(status.kubernetes_resources.version.version.as_deref(), Some(VERSION));
    assert!(plan(&tcp)
        .iter()
        .any(|planned| planned.step == Step::Workload && planned.decision == PhaseDecision::Execute));
}

#[test]
fn test_version_change_over_unchanged_workload_is_upgrading() {
    let mut tcp = tenant();
    tcp.status = Some(converged("100"));
    assert_eq!(refresh(&mut tcp, at(1)).status, KubernetesVersionStatus::Ready);

    // The Deployment still reports the old template fully rolled out
    tcp.spec.kubernetes.version = "v1.31.0".to_string();
    let readiness = refresh(&mut tcp, at(2));
    assert_eq!(readiness.status, KubernetesVersionStatus::Upgrading);
    assert!(readiness.blockers.contains(&Blocker::WorkloadOutdated {
        applied: Some(VERSION.to_string()),
        desired: "v1.31.0".to_string(),
    }));

    let status = tcp.status.as_ref().unwrap();
    assert_eq!(status.kubernetes_resources.version.version.as_deref(), Some(VERSION));
    assert!(plan(&tcp)
        .iter()
        .any(|planned| planned.step == Step::Workload && planned.decision == PhaseDecision::Execute));
}

#[test]
fn test_version_change_without_running_version_is_upgrading() {
    let mut tcp = tenant();
    tcp.status = Some(converged("100"));
    tcp.spec.kubernetes.version = "v1.31.0".to_string();

    let readiness = derive_readiness(&tcp);
    assert_eq!(readiness.status, KubernetesVersionStatus::Upgrading);
    assert!(readiness.running_version.is_none());
}

#[test]
fn test_upgrade_completes() {
    let mut tcp = tenant();
    tcp.status = Some(converged("100"));
    refresh(&mut tcp, at(1));

    tcp.spec.kubernetes.version = "v1.31.0".to_string();
    if let Some(status) = tcp.status.as_mut() {
        status.kubernetes_resources.deployment = Some(deployment_of("v1.31.0", 2, 2));
    }

    let readiness = refresh(&mut tcp, at(2));
    assert_eq!(readiness.status, KubernetesVersionStatus::Ready);
    assert!(plan(&tcp)
        .iter()
        .any(|planned| planned.step == Step::Workload && planned.decision == PhaseDecision::Skip));
    assert_eq!(
        tcp.status
            .as_ref()
            .unwrap()
            .kubernetes_resources
            .version
            .version
            .as_deref(),
        Some("v1.31.0")
    );
}

#[test]
fn test_regenerated_bootstrap_config_drops_out_of_ready() {
    let mut tcp = tenant();
    tcp.status = Some(converged("100"));
    assert_eq!(refresh(&mut tcp, at(1)).status, KubernetesVersionStatus::Ready);

    if let Some(status) = tcp.status.as_mut() {
        status
            .bootstrap_config
            .record_success("alpha-kubeadmconfig", token("101"), at(2));
    }

    let readiness = refresh(&mut tcp, at(2));
    assert_eq!(readiness.status, KubernetesVersionStatus::NotReady);
    for phase in BootstrapPhase::ALL {
        assert!(readiness.blockers.contains(&Blocker::StalePhase(phase)));
    }
    for addon in Addon::ALL {
        assert!(readiness.blockers.contains(&Blocker::StaleAddon(addon)));
    }

    let steps = plan(&tcp);
    for phase in BootstrapPhase::ALL {
        assert!(steps
            .iter()
            .any(|p| p.step == Step::BootstrapPhase(phase) && p.decision == PhaseDecision::Execute));
    }

    // Phases catch up one at a time; Ready returns only after the last one
    let mut consumers: Vec<Step> = BootstrapPhase::ALL
        .into_iter()
        .map(Step::BootstrapPhase)
        .chain(Addon::ALL.into_iter().map(Step::Addon))
        .collect();
    let last = consumers.pop().unwrap();
    for step in consumers {
        consume(&mut tcp, step, "101");
        assert_eq!(refresh(&mut tcp, at(3)).status, KubernetesVersionStatus::NotReady);
    }
    consume(&mut tcp, last, "101");
    assert_eq!(refresh(&mut tcp, at(4)).status, KubernetesVersionStatus::Ready);
}

#[test]
fn test_disabled_addon_does_not_block() {
    let mut tcp = tenant();
    tcp.spec.addons.kube_proxy.enabled = false;
    let mut status = converged("100");
    status.addons.kube_proxy.record_disabled(at(1));
    status
        .bootstrap_config
        .record_success("alpha-kubeadmconfig", token("101"), at(2));
    for phase in BootstrapPhase::ALL {
        status
            .bootstrap_phases
            .get_mut(phase)
            .record_success(token("101"), at(2));
    }
    status.addons.core_dns.record_success(token("101"), at(2));
    tcp.status = Some(status);

    let readiness = derive_readiness(&tcp);
    assert_eq!(readiness.status, KubernetesVersionStatus::Ready);
}

#[test]
fn test_unavailable_replicas_block_ready() {
    let mut tcp = tenant();
    let mut status = converged("100");
    status.kubernetes_resources.deployment = Some(deployment(1, 2));
    tcp.status = Some(status);

    let readiness = derive_readiness(&tcp);
    assert_eq!(readiness.status, KubernetesVersionStatus::NotReady);
    assert!(readiness.blockers.contains(&Blocker::WorkloadUnavailable {
        available: 1,
        desired: 2
    }));
}

#[test]
fn test_partially_provisioned_tenant_is_not_ready() {
    let mut tcp = tenant();
    let mut status = converged("100");
    status.kubeconfigs.scheduler = Default::default();
    tcp.status = Some(status);

    let readiness = refresh(&mut tcp, at(1));
    assert_eq!(readiness.status, KubernetesVersionStatus::NotReady);
    assert_eq!(
        readiness.blockers,
        vec![Blocker::MissingKubeconfigs(vec!["scheduler"])]
    );
    assert!(tcp
        .status
        .as_ref()
        .unwrap()
        .kubernetes_resources
        .version
        .version
        .is_none());
}

#[test]
fn test_invalid_spec_blocks_ready() {
    let mut tcp = tenant();
    tcp.status = Some(converged("100"));
    assert_eq!(refresh(&mut tcp, at(1)).status, KubernetesVersionStatus::Ready);

    tcp.spec.network_profile.pod_cidr = "10.96.0.0/12".to_string();
    let readiness = refresh(&mut tcp, at(2));
    assert_eq!(readiness.status, KubernetesVersionStatus::NotReady);
    assert!(matches!(readiness.blockers[0], Blocker::InvalidSpec(_)));

    // Nothing is retried against a spec that cannot be reconciled
    tcp.spec.kubernetes.version = "v1.31.0".to_string();
    assert!(plan(&tcp).iter().all(|planned| !planned.decision.needs_work()));
}

fn consume(tcp: &mut tenant_control_plane::TenantControlPlane, step: Step, value: &str) {
    let Some(status) = tcp.status.as_mut() else {
        return;
    };
    match step {
        Step::BootstrapPhase(phase) => status
            .bootstrap_phases
            .get_mut(phase)
            .record_success(token(value), at(3)),
        Step::Addon(addon) => status.addons.get_mut(addon).record_success(token(value), at(3)),
        _ => {}
    }
}
