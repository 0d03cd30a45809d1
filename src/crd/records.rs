//! # Status Records
//!
//! Leaf records of the observed state. Each one carries its own location (or
//! consumed token) and last-update timestamp so subsystems converge independently.
//!
//! Records only move forward: `record_success` never rolls `last_update` back and
//! never clears a location. The single way back to an empty record is whole-tenant
//! deprovisioning (see [`super::TenantControlPlaneStatus::deprovision`]).

use crate::convergence::fencing::advance;
use crate::convergence::token::deserialize_optional;
use crate::convergence::{PhaseRecord, VersionToken};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Location of a generated Secret (certificate, key pair or kubeconfig)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

/// Certificate or key pair record
pub type CertificateRecord = SecretRecord;

/// Kubeconfig record
pub type KubeconfigRecord = SecretRecord;

impl SecretRecord {
    /// Record that the artifact was (re)written to `secret_name` at `at`.
    /// An empty name is ignored so a known location is never cleared.
    pub fn record_success(&mut self, secret_name: impl Into<String>, at: DateTime<Utc>) {
        let secret_name = secret_name.into();
        if !secret_name.is_empty() {
            self.secret_name = Some(secret_name);
        }
        advance(&mut self.last_update, at);
    }

    pub fn is_populated(&self) -> bool {
        self.secret_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }

    pub fn secret_name(&self) -> Option<&str> {
        self.secret_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// The generated bootstrap (kubeadm) configuration artifact
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfigRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configmap_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    /// Token of the stored configuration. Bootstrap phases and add-ons fence on it.
    #[serde(
        default,
        deserialize_with = "deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_version: Option<VersionToken>,
}

impl BootstrapConfigRecord {
    pub fn record_success(
        &mut self,
        configmap_name: impl Into<String>,
        token: VersionToken,
        at: DateTime<Utc>,
    ) {
        let configmap_name = configmap_name.into();
        if !configmap_name.is_empty() {
            self.configmap_name = Some(configmap_name);
        }
        self.resource_version = Some(token);
        advance(&mut self.last_update, at);
    }

    /// Current token of the bootstrap configuration, if it exists yet
    pub fn current_token(&self) -> Option<&VersionToken> {
        self.resource_version.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.configmap_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
            && self.resource_version.is_some()
    }
}

/// A bootstrap phase that consumed a version of the bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapPhaseRecord {
    #[serde(
        default,
        deserialize_with = "deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub kubeadm_config_resource_version: Option<VersionToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl BootstrapPhaseRecord {
    pub fn record_success(&mut self, consumed: VersionToken, at: DateTime<Utc>) {
        self.kubeadm_config_resource_version = Some(consumed);
        advance(&mut self.last_update, at);
    }
}

impl PhaseRecord for BootstrapPhaseRecord {
    fn consumed_token(&self) -> Option<&VersionToken> {
        self.kubeadm_config_resource_version.as_ref()
    }

    fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

/// Add-on (CoreDNS, kube-proxy) installation record
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonRecord {
    #[serde(default)]
    pub enabled: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub kubeadm_config_resource_version: Option<VersionToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl AddonRecord {
    pub fn record_success(&mut self, consumed: VersionToken, at: DateTime<Utc>) {
        self.enabled = true;
        self.kubeadm_config_resource_version = Some(consumed);
        advance(&mut self.last_update, at);
    }

    /// Mark the add-on removed. Consumed token and history are kept.
    pub fn record_disabled(&mut self, at: DateTime<Utc>) {
        self.enabled = false;
        advance(&mut self.last_update, at);
    }
}

impl PhaseRecord for AddonRecord {
    fn consumed_token(&self) -> Option<&VersionToken> {
        self.kubeadm_config_resource_version.as_ref()
    }

    fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}
