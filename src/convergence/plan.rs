//! # Provisioning Plan
//!
//! The dependency graph between provisioning steps, expressed purely as data:
//! each step looks only at the status of its direct inputs. While the spec
//! fails validation no step is executed.
//!
//! ```text
//! certificates ─┬─> kubeconfigs ──> bootstrap config ──┬─> kubeadm phases
//! storage       │                                      └─> add-ons
//!               └─> workload
//! service ──> ingress
//! ```

use super::fencing::{decide, Artifact, PhaseDecision, UnmetDependency};
use super::readiness::addon_enabled;
use crate::crd::{Addon, BootstrapPhase, TenantControlPlane};
use crate::validation;
use std::fmt;
use tracing::{debug, warn};

/// A provisioning step owned by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Certificates,
    Storage,
    Kubeconfigs,
    BootstrapConfig,
    BootstrapPhase(BootstrapPhase),
    Addon(Addon),
    Workload,
    Service,
    Ingress,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Certificates => f.write_str("certificates"),
            Step::Storage => f.write_str("storage"),
            Step::Kubeconfigs => f.write_str("kubeconfigs"),
            Step::BootstrapConfig => f.write_str("kubeadmconfig"),
            Step::BootstrapPhase(phase) => write!(f, "kubeadmPhase.{phase}"),
            Step::Addon(addon) => write!(f, "addons.{addon}"),
            Step::Workload => f.write_str("deployment"),
            Step::Service => f.write_str("service"),
            Step::Ingress => f.write_str("ingress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub step: Step,
    pub decision: PhaseDecision,
}

/// Decide every step for the current observation
pub fn plan(tcp: &TenantControlPlane) -> Vec<PlannedStep> {
    let status = tcp.observed();
    let certificates_ready = status.certificates.all_populated();
    let kubeconfigs_ready = status.kubeconfigs.all_populated();
    let config_token = status.bootstrap_config.current_token();

    let violations = validation::validate(&tcp.spec);
    if !violations.is_empty() {
        warn!(
            resource.name = %tcp.metadata.name.as_deref().unwrap_or_default(),
            violations = %validation::join(&violations),
            "spec cannot be reconciled, holding every provisioning step"
        );
    }

    let mut steps = Vec::with_capacity(12);
    let mut push = |step: Step, decision: PhaseDecision| {
        let decision = if decision.needs_work() && !violations.is_empty() {
            PhaseDecision::InvalidSpec
        } else {
            decision
        };
        debug!(step = %step, decision = ?decision, "planned provisioning step");
        steps.push(PlannedStep { step, decision });
    };

    push(Step::Certificates, execute_unless(certificates_ready));

    let storage_ready = status
        .storage
        .etcd
        .as_ref()
        .is_some_and(|etcd| etcd.role.exists && etcd.user.exists);
    push(Step::Storage, execute_unless(storage_ready));

    push(
        Step::Kubeconfigs,
        gate(certificates_ready, Artifact::Certificates)
            .unwrap_or_else(|| execute_unless(kubeconfigs_ready)),
    );

    push(
        Step::BootstrapConfig,
        gate(kubeconfigs_ready, Artifact::Kubeconfigs)
            .unwrap_or_else(|| execute_unless(status.bootstrap_config.is_populated())),
    );

    for phase in BootstrapPhase::ALL {
        let record = status.bootstrap_phases.get(phase);
        push(
            Step::BootstrapPhase(phase),
            decide(record, Artifact::BootstrapConfig, config_token),
        );
    }

    for addon in Addon::ALL {
        let record = status.addons.get(addon);
        let decision = if !addon_enabled(tcp, addon) {
            PhaseDecision::Disabled
        } else if config_token.is_some() && !record.enabled {
            // Re-enabled after removal: the consumed token belongs to the old install
            PhaseDecision::Execute
        } else {
            decide(record, Artifact::BootstrapConfig, config_token)
        };
        push(Step::Addon(addon), decision);
    }

    let workload_current = status
        .kubernetes_resources
        .deployment
        .as_ref()
        .is_some_and(|d| d.is_current(tcp.desired_version(), tcp.desired_replicas()));
    push(
        Step::Workload,
        gate(certificates_ready, Artifact::Certificates)
            .or_else(|| gate(kubeconfigs_ready, Artifact::Kubeconfigs))
            .unwrap_or_else(|| execute_unless(workload_current)),
    );

    let service = status.kubernetes_resources.service.as_ref();
    push(Step::Service, execute_unless(service.is_some()));

    let ingress_enabled = tcp
        .spec
        .control_plane
        .ingress
        .as_ref()
        .is_some_and(|ingress| ingress.enabled);
    let ingress_decision = if !ingress_enabled {
        PhaseDecision::Disabled
    } else {
        gate(service.is_some(), Artifact::Service).unwrap_or_else(|| {
            execute_unless(status.kubernetes_resources.ingress.is_some())
        })
    };
    push(Step::Ingress, ingress_decision);

    steps
}

fn execute_unless(done: bool) -> PhaseDecision {
    if done {
        PhaseDecision::Skip
    } else {
        PhaseDecision::Execute
    }
}

/// `Some(Blocked)` when the input is not available yet
fn gate(available: bool, input: Artifact) -> Option<PhaseDecision> {
    (!available).then(|| PhaseDecision::Blocked(UnmetDependency::new(input)))
}
