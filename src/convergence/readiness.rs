//! # Readiness
//!
//! Derives the aggregate version status from the independent status groups.
//!
//! Ties always resolve toward the least-ready state: the control plane is never
//! reported Ready while any dependency is missing or stale.

use super::fencing::PhaseRecord;
use crate::crd::{
    Addon, BootstrapPhase, KubernetesVersionStatus, TenantControlPlane, TenantControlPlaneStatus,
};
use crate::validation::{self, Violation};
use std::fmt;
use tracing::debug;

/// Something that keeps the control plane from being Ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    InvalidSpec(Vec<Violation>),
    MissingCertificates(Vec<&'static str>),
    MissingKubeconfigs(Vec<&'static str>),
    BootstrapConfigMissing,
    StalePhase(BootstrapPhase),
    StaleAddon(Addon),
    WorkloadMissing,
    WorkloadOutdated { applied: Option<String>, desired: String },
    WorkloadRollingOut { updated: i32, desired: i32 },
    WorkloadUnavailable { available: i32, desired: i32 },
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocker::InvalidSpec(violations) => {
                write!(f, "invalid spec: {}", validation::join(violations))
            }
            Blocker::MissingCertificates(names) => {
                write!(f, "certificates not issued: {}", names.join(", "))
            }
            Blocker::MissingKubeconfigs(names) => {
                write!(f, "kubeconfigs not generated: {}", names.join(", "))
            }
            Blocker::BootstrapConfigMissing => f.write_str("bootstrap configuration not generated"),
            Blocker::StalePhase(phase) => {
                write!(f, "kubeadm phase {phase} has not consumed the current configuration")
            }
            Blocker::StaleAddon(addon) => {
                write!(f, "add-on {addon} has not consumed the current configuration")
            }
            Blocker::WorkloadMissing => f.write_str("control plane deployment not observed"),
            Blocker::WorkloadOutdated { applied, desired } => write!(
                f,
                "control plane deployment runs {}, want {desired}",
                applied.as_deref().unwrap_or("an unrecorded version")
            ),
            Blocker::WorkloadRollingOut { updated, desired } => {
                write!(f, "{updated}/{desired} control plane replicas updated")
            }
            Blocker::WorkloadUnavailable { available, desired } => {
                write!(f, "{available}/{desired} control plane replicas available")
            }
        }
    }
}

/// Result of a readiness derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub status: KubernetesVersionStatus,
    /// Version to record as running; set only when Ready
    pub running_version: Option<String>,
    pub blockers: Vec<Blocker>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.status == KubernetesVersionStatus::Ready
    }

    /// Blockers joined for condition messages
    pub fn message(&self) -> String {
        if self.blockers.is_empty() {
            return "control plane is ready".to_string();
        }
        self.blockers
            .iter()
            .map(Blocker::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Derive readiness, validating the spec first
pub fn derive_readiness(tcp: &TenantControlPlane) -> Readiness {
    let violations = validation::validate(&tcp.spec);
    derive_with_violations(tcp, violations)
}

pub(crate) fn derive_with_violations(
    tcp: &TenantControlPlane,
    violations: Vec<Violation>,
) -> Readiness {
    let status = tcp.observed();
    let desired_version = tcp.desired_version();
    let desired_replicas = tcp.desired_replicas();

    let mut blockers = Vec::new();
    if !violations.is_empty() {
        blockers.push(Blocker::InvalidSpec(violations));
    }
    collect_blockers(tcp, &status, &mut blockers);

    // Either the last Ready version or the applied template still lags the spec
    let running = status.kubernetes_resources.version.version.as_deref();
    let deployment = status.kubernetes_resources.deployment.as_ref();
    let current = deployment.is_some_and(|d| d.is_current(desired_version, desired_replicas));
    let superseded = running
        .into_iter()
        .chain(deployment.and_then(|d| d.version.as_deref()))
        .any(|version| version != desired_version);

    let derived = if status.is_pristine() {
        KubernetesVersionStatus::Provisioning
    } else if superseded && !current {
        KubernetesVersionStatus::Upgrading
    } else if blockers.is_empty() && current {
        KubernetesVersionStatus::Ready
    } else {
        KubernetesVersionStatus::NotReady
    };

    debug!(
        resource.name = %tcp.metadata.name.as_deref().unwrap_or_default(),
        status = %derived,
        blockers = blockers.len(),
        "derived control plane readiness"
    );

    Readiness {
        status: derived,
        running_version: (derived == KubernetesVersionStatus::Ready)
            .then(|| desired_version.to_string()),
        blockers,
    }
}

fn collect_blockers(
    tcp: &TenantControlPlane,
    status: &TenantControlPlaneStatus,
    blockers: &mut Vec<Blocker>,
) {
    let missing = status.certificates.missing();
    if !missing.is_empty() {
        blockers.push(Blocker::MissingCertificates(missing));
    }

    let missing = status.kubeconfigs.missing();
    if !missing.is_empty() {
        blockers.push(Blocker::MissingKubeconfigs(missing));
    }

    match status.bootstrap_config.current_token() {
        None => blockers.push(Blocker::BootstrapConfigMissing),
        Some(current) => {
            for phase in BootstrapPhase::ALL {
                if status.bootstrap_phases.get(phase).is_stale(current) {
                    blockers.push(Blocker::StalePhase(phase));
                }
            }
            for addon in Addon::ALL {
                if !addon_enabled(tcp, addon) {
                    continue;
                }
                let record = status.addons.get(addon);
                if !record.enabled || record.is_stale(current) {
                    blockers.push(Blocker::StaleAddon(addon));
                }
            }
        }
    }

    let Some(deployment) = status.kubernetes_resources.deployment.as_ref() else {
        blockers.push(Blocker::WorkloadMissing);
        return;
    };
    let desired_version = tcp.desired_version();
    if deployment.version.as_deref() != Some(desired_version) {
        blockers.push(Blocker::WorkloadOutdated {
            applied: deployment.version.clone(),
            desired: desired_version.to_string(),
        });
    }
    let desired = tcp.desired_replicas();
    if deployment.updated_replicas() < desired {
        blockers.push(Blocker::WorkloadRollingOut {
            updated: deployment.updated_replicas(),
            desired,
        });
    }
    if deployment.available_replicas() < desired {
        blockers.push(Blocker::WorkloadUnavailable {
            available: deployment.available_replicas(),
            desired,
        });
    }
}

pub(crate) fn addon_enabled(tcp: &TenantControlPlane, addon: Addon) -> bool {
    match addon {
        Addon::CoreDns => tcp.spec.addons.core_dns.enabled,
        Addon::KubeProxy => tcp.spec.addons.kube_proxy.enabled,
    }
}
