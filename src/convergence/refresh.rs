//! # Status Refresh
//!
//! Recompute the derived parts of the status (version status, running version,
//! endpoint, conditions) from the sub-records. Sub-records themselves are never
//! touched here; they belong to the phases that produce them.

use super::endpoint::derive_endpoint;
use super::readiness::{derive_with_violations, Readiness};
use crate::conditions::{
    build_condition, set_condition, status_of, CONDITION_READY, CONDITION_SPEC_VALID,
    REASON_INVALID_SPEC, REASON_VALID,
};
use crate::crd::TenantControlPlane;
use crate::observability::metrics;
use crate::validation;
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use tracing::info;

/// Refresh derived status fields in place and return the readiness that was applied
pub fn refresh(tcp: &mut TenantControlPlane, now: DateTime<Utc>) -> Readiness {
    let violations = validation::validate(&tcp.spec);
    let spec_condition = if violations.is_empty() {
        build_condition(
            CONDITION_SPEC_VALID,
            status_of(true),
            REASON_VALID,
            "spec can be reconciled",
            now,
        )
    } else {
        build_condition(
            CONDITION_SPEC_VALID,
            status_of(false),
            REASON_INVALID_SPEC,
            validation::join(&violations),
            now,
        )
    };

    let readiness = derive_with_violations(tcp, violations);
    let endpoint = derive_endpoint(tcp);
    let name = tcp.name_any();
    let namespace = tcp.namespace().unwrap_or_default();

    let status = tcp.status.get_or_insert_with(Default::default);
    let version = &mut status.kubernetes_resources.version;
    let previous = version.status;
    version.status = readiness.status;
    if let Some(running) = readiness.running_version.as_ref() {
        version.version = Some(running.clone());
    }

    if endpoint.is_some() {
        status.control_plane_endpoint = endpoint;
    }

    set_condition(&mut status.conditions, spec_condition);
    set_condition(
        &mut status.conditions,
        build_condition(
            CONDITION_READY,
            status_of(readiness.is_ready()),
            readiness.status.as_str(),
            readiness.message(),
            now,
        ),
    );

    if previous != readiness.status {
        info!(
            resource.name = %name,
            resource.namespace = %namespace,
            from = %previous,
            to = %readiness.status,
            "control plane version status changed"
        );
    }
    metrics::increment_readiness_evaluations_total(readiness.status.as_str());

    readiness
}
