//! # Fencing
//!
//! The convergence rule shared by every token-consuming phase:
//! a phase re-executes iff the current token of its *direct* input differs from
//! the token stored in its own record. A missing input token is an unmet
//! dependency, never a hard failure.

use super::token::{Freshness, VersionToken};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Artifacts that provisioning phases consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Certificates,
    Storage,
    Kubeconfigs,
    BootstrapConfig,
    Workload,
    Service,
    Ingress,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Artifact::Certificates => "certificates",
            Artifact::Storage => "storage backend",
            Artifact::Kubeconfigs => "kubeconfigs",
            Artifact::BootstrapConfig => "bootstrap configuration",
            Artifact::Workload => "control plane workload",
            Artifact::Service => "control plane service",
            Artifact::Ingress => "control plane ingress",
        };
        f.write_str(name)
    }
}

/// A phase input is missing or has not been versioned yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unmet dependency: {artifact} is not available yet")]
pub struct UnmetDependency {
    pub artifact: Artifact,
}

impl UnmetDependency {
    pub fn new(artifact: Artifact) -> Self {
        Self { artifact }
    }
}

/// A status record that remembers which version of its input it consumed
pub trait PhaseRecord {
    /// Token of the input version last processed successfully, if any
    fn consumed_token(&self) -> Option<&VersionToken>;

    /// Time of the last successful execution
    fn last_update(&self) -> Option<DateTime<Utc>>;

    fn freshness(&self, current: &VersionToken) -> Freshness {
        Freshness::of(self.consumed_token(), current)
    }

    /// True when the record never ran or ran against a different input version
    fn is_stale(&self, current: &VersionToken) -> bool {
        self.freshness(current).is_stale()
    }
}

/// What a reconciler should do with a phase on this observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseDecision {
    /// Work already reflects the current input
    Skip,
    /// Input changed (or never consumed): run the phase
    Execute,
    /// Input is not available yet; re-observe later
    Blocked(UnmetDependency),
    /// Phase is switched off in the desired state
    Disabled,
    /// Desired state cannot be reconciled as written; wait for a spec change
    InvalidSpec,
}

impl PhaseDecision {
    pub fn needs_work(&self) -> bool {
        matches!(self, PhaseDecision::Execute)
    }
}

/// Resolve an input token or report the unmet dependency
pub fn require(
    artifact: Artifact,
    current: Option<&VersionToken>,
) -> Result<&VersionToken, UnmetDependency> {
    current.ok_or(UnmetDependency::new(artifact))
}

/// Apply the convergence rule to a single record
pub fn decide<R: PhaseRecord + ?Sized>(
    record: &R,
    input: Artifact,
    current: Option<&VersionToken>,
) -> PhaseDecision {
    let current = match require(input, current) {
        Ok(token) => token,
        Err(unmet) => {
            debug!(artifact = %input, "phase input has no version token yet");
            return PhaseDecision::Blocked(unmet);
        }
    };

    match record.freshness(current) {
        Freshness::Fresh => PhaseDecision::Skip,
        Freshness::Stale | Freshness::NeverExecuted => PhaseDecision::Execute,
    }
}

/// Move a last-update timestamp forward, never backward
pub(crate) fn advance(last_update: &mut Option<DateTime<Utc>>, at: DateTime<Utc>) {
    match last_update {
        Some(previous) if *previous >= at => {}
        _ => *last_update = Some(at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Record(Option<VersionToken>);

    impl PhaseRecord for Record {
        fn consumed_token(&self) -> Option<&VersionToken> {
            self.0.as_ref()
        }

        fn last_update(&self) -> Option<DateTime<Utc>> {
            None
        }
    }

    fn token(value: &str) -> VersionToken {
        VersionToken::new(value).unwrap()
    }

    #[test]
    fn test_decide_blocks_without_input_token() {
        let decision = decide(&Record(None), Artifact::BootstrapConfig, None);
        assert_eq!(
            decision,
            PhaseDecision::Blocked(UnmetDependency::new(Artifact::BootstrapConfig))
        );
        assert!(!decision.needs_work());
    }

    #[test]
    fn test_decide_executes_when_never_run() {
        let current = token("10");
        let decision = decide(&Record(None), Artifact::BootstrapConfig, Some(&current));
        assert_eq!(decision, PhaseDecision::Execute);
    }

    #[test]
    fn test_decide_executes_when_stale_and_skips_when_fresh() {
        let current = token("11");
        assert_eq!(
            decide(&Record(Some(token("10"))), Artifact::BootstrapConfig, Some(&current)),
            PhaseDecision::Execute
        );
        assert_eq!(
            decide(&Record(Some(token("11"))), Artifact::BootstrapConfig, Some(&current)),
            PhaseDecision::Skip
        );
    }

    #[test]
    fn test_advance_is_monotonic() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let mut last = None;
        advance(&mut last, late);
        assert_eq!(last, Some(late));

        advance(&mut last, early);
        assert_eq!(last, Some(late));
    }
}
