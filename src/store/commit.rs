//! # Optimistic-Concurrency Commits
//!
//! Read, mutate, commit against the read's resource version, and on conflict
//! re-read and try again. Unchanged objects are never written so a no-op
//! reconcile does not produce a watch event. Spec changes that fail
//! validation are rejected before anything is written.

use super::backoff::FibonacciBackoff;
use super::TenantControlPlaneStore;
use crate::config::CommitConfig;
use crate::convergence::{derive_readiness, refresh, Readiness};
use crate::crd::TenantControlPlane;
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::validation;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Status,
    Spec,
}

impl Target {
    fn unchanged(self, before: &TenantControlPlane, after: &TenantControlPlane) -> bool {
        match self {
            Target::Status => before.status == after.status,
            Target::Spec => before.spec == after.spec && before.metadata == after.metadata,
        }
    }
}

/// Commit a status mutation under optimistic concurrency.
///
/// `mutate` runs against a fresh read on every attempt, so it must be safe to
/// call more than once.
pub async fn commit_status<S, F>(
    store: &S,
    namespace: &str,
    name: &str,
    config: &CommitConfig,
    mutate: F,
) -> Result<TenantControlPlane>
where
    S: TenantControlPlaneStore + ?Sized,
    F: FnMut(&mut TenantControlPlane),
{
    commit(store, namespace, name, config, Target::Status, mutate).await
}

/// Commit a spec (and metadata) mutation under optimistic concurrency.
///
/// Fails with [`Error::InvalidSpec`] when the mutated spec cannot be
/// reconciled; metadata-only changes are not validated.
pub async fn commit_spec<S, F>(
    store: &S,
    namespace: &str,
    name: &str,
    config: &CommitConfig,
    mutate: F,
) -> Result<TenantControlPlane>
where
    S: TenantControlPlaneStore + ?Sized,
    F: FnMut(&mut TenantControlPlane),
{
    commit(store, namespace, name, config, Target::Spec, mutate).await
}

/// Recompute derived status fields and commit them
pub async fn refresh_and_commit<S>(
    store: &S,
    namespace: &str,
    name: &str,
    config: &CommitConfig,
) -> Result<(TenantControlPlane, Readiness)>
where
    S: TenantControlPlaneStore + ?Sized,
{
    let mut readiness = None;
    let committed = commit_status(store, namespace, name, config, |tcp| {
        readiness = Some(refresh(tcp, Utc::now()));
    })
    .await?;

    let readiness = readiness.unwrap_or_else(|| derive_readiness(&committed));
    Ok((committed, readiness))
}

async fn commit<S, F>(
    store: &S,
    namespace: &str,
    name: &str,
    config: &CommitConfig,
    target: Target,
    mut mutate: F,
) -> Result<TenantControlPlane>
where
    S: TenantControlPlaneStore + ?Sized,
    F: FnMut(&mut TenantControlPlane),
{
    let started = Instant::now();
    let mut backoff = FibonacciBackoff::new(config.backoff_min, config.backoff_max);
    let attempts = config.max_attempts.max(1);

    for attempt in 1..=attempts {
        let current = store.get(namespace, name).await?;
        let mut desired = current.clone();
        mutate(&mut desired);

        if target.unchanged(&current, &desired) {
            debug!(
                resource.name = %name,
                resource.namespace = %namespace,
                ?target,
                "Skipping commit - object unchanged"
            );
            return Ok(current);
        }

        if target == Target::Spec && current.spec != desired.spec {
            validation::ensure_valid(&desired.spec)?;
        }

        let written = match target {
            Target::Status => store.replace_status(&desired).await,
            Target::Spec => store.replace_spec(&desired).await,
        };

        match written {
            Ok(committed) => {
                metrics::increment_status_commits_total();
                metrics::observe_commit_duration(started.elapsed().as_secs_f64());
                debug!(
                    resource.name = %name,
                    resource.namespace = %namespace,
                    ?target,
                    attempt,
                    resource_version = committed.metadata.resource_version.as_deref().unwrap_or_default(),
                    "Committed TenantControlPlane"
                );
                return Ok(committed);
            }
            Err(e) if e.is_conflict() => {
                metrics::increment_commit_conflicts_total();
                if attempt < attempts {
                    let delay = backoff.next_backoff();
                    info!(
                        resource.name = %name,
                        resource.namespace = %namespace,
                        ?target,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Write conflict, re-reading and retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
            Err(e) => return Err(e),
        }
    }

    metrics::increment_commit_retries_exhausted_total();
    metrics::observe_commit_duration(started.elapsed().as_secs_f64());
    warn!(
        resource.name = %name,
        resource.namespace = %namespace,
        ?target,
        attempts,
        "Giving up after repeated write conflicts"
    );
    Err(Error::RetriesExhausted {
        namespace: namespace.to_string(),
        name: name.to_string(),
        attempts,
    })
}
