//! # Validation
//!
//! Detects desired states that can never be reconciled as written
//! (irrecoverable drift). Violations are surfaced through the `SpecValid`
//! condition instead of being retried.

use crate::crd::{ServiceType, TenantControlPlaneSpec};
use crate::error::{Error, Result};
use ipnetwork::IpNetwork;
use regex::Regex;
use semver::Version;
use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

// RFC 1123 subdomain: lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot
static DNS_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("DNS subdomain regex is valid")
});

/// A single reason the spec cannot be reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON path of the offending field, relative to `spec`
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spec.{}: {}", self.field, self.message)
    }
}

/// Collect every violation in the spec. An empty result means the spec is reconcilable.
pub fn validate(spec: &TenantControlPlaneSpec) -> Vec<Violation> {
    let mut violations = Vec::new();
    validate_control_plane(spec, &mut violations);
    validate_kubernetes(spec, &mut violations);
    validate_network(spec, &mut violations);
    violations
}

/// Fail with [`Error::InvalidSpec`] listing every violation
pub fn ensure_valid(spec: &TenantControlPlaneSpec) -> Result<()> {
    let violations = validate(spec);
    if violations.is_empty() {
        return Ok(());
    }
    Err(Error::InvalidSpec(join(&violations)))
}

/// Human-readable summary of violations, `; `-separated
pub fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn validate_control_plane(spec: &TenantControlPlaneSpec, violations: &mut Vec<Violation>) {
    let control_plane = &spec.control_plane;

    if control_plane.deployment.replicas < 0 {
        violations.push(Violation::new(
            "controlPlane.deployment.replicas",
            format!("must not be negative (got {})", control_plane.deployment.replicas),
        ));
    }

    let Some(ingress) = control_plane.ingress.as_ref() else {
        return;
    };

    if let Some(hostname) = ingress.hostname.as_deref() {
        if !is_dns_subdomain(hostname) {
            violations.push(Violation::new(
                "controlPlane.ingress.hostname",
                format!("'{hostname}' is not a valid DNS name"),
            ));
        }
    }

    let has_hostname = ingress.hostname.as_deref().is_some_and(|h| !h.is_empty());
    if ingress.enabled && !has_hostname && spec.network_profile.domain.is_empty() {
        violations.push(Violation::new(
            "controlPlane.ingress",
            "an enabled ingress needs a hostname or networkProfile.domain",
        ));
    }
}

fn validate_kubernetes(spec: &TenantControlPlaneSpec, violations: &mut Vec<Violation>) {
    let version = spec.kubernetes.version.trim();
    let bare = version.strip_prefix('v').unwrap_or(version);
    if let Err(e) = Version::parse(bare) {
        violations.push(Violation::new(
            "kubernetes.version",
            format!("'{version}' is not a valid version: {e}"),
        ));
    }

    if spec.kubernetes.admission_controllers.is_empty() {
        violations.push(Violation::new(
            "kubernetes.admissionControllers",
            "at least one admission controller must be enabled",
        ));
    }
}

fn validate_network(spec: &TenantControlPlaneSpec, violations: &mut Vec<Violation>) {
    let profile = &spec.network_profile;
    let service_type = spec.control_plane.service.service_type;

    if !(1..=65535).contains(&profile.port) {
        violations.push(Violation::new(
            "networkProfile.port",
            format!("{} is outside 1-65535", profile.port),
        ));
    }

    if !profile.domain.is_empty() && !is_dns_subdomain(&profile.domain) {
        violations.push(Violation::new(
            "networkProfile.domain",
            format!("'{}' is not a valid DNS name", profile.domain),
        ));
    }

    if profile.address().is_none() && service_type != ServiceType::LoadBalancer {
        violations.push(Violation::new(
            "networkProfile.address",
            format!("required for {service_type} services"),
        ));
    }

    if profile.allow_address_as_external_ip {
        if service_type == ServiceType::LoadBalancer {
            violations.push(Violation::new(
                "networkProfile.allowAddressAsExternalIP",
                "cannot be used with LoadBalancer services",
            ));
        }
        if profile.address().is_none() {
            violations.push(Violation::new(
                "networkProfile.allowAddressAsExternalIP",
                "requires networkProfile.address",
            ));
        }
    }

    let service_cidr = parse_cidr("networkProfile.serviceCidr", &profile.service_cidr, violations);
    let pod_cidr = parse_cidr("networkProfile.podCidr", &profile.pod_cidr, violations);

    if let (Some(service), Some(pod)) = (service_cidr, pod_cidr) {
        if overlaps(service, pod) {
            violations.push(Violation::new(
                "networkProfile.podCidr",
                format!("{pod} overlaps service CIDR {service}"),
            ));
        }
    }

    if profile.dns_service_ips.is_empty() {
        violations.push(Violation::new(
            "networkProfile.dnsServiceIPs",
            "at least one DNS service IP is required",
        ));
    }

    for raw in &profile.dns_service_ips {
        match raw.parse::<IpAddr>() {
            Ok(ip) => {
                if let Some(service) = service_cidr {
                    if !service.contains(ip) {
                        violations.push(Violation::new(
                            "networkProfile.dnsServiceIPs",
                            format!("{ip} is outside service CIDR {service}"),
                        ));
                    }
                }
            }
            Err(_) => violations.push(Violation::new(
                "networkProfile.dnsServiceIPs",
                format!("'{raw}' is not an IP address"),
            )),
        }
    }
}

fn parse_cidr(field: &'static str, raw: &str, violations: &mut Vec<Violation>) -> Option<IpNetwork> {
    if raw.is_empty() {
        violations.push(Violation::new(field, "is required"));
        return None;
    }
    match raw.parse::<IpNetwork>() {
        Ok(network) => Some(network),
        Err(e) => {
            violations.push(Violation::new(field, format!("'{raw}' is not a CIDR: {e}")));
            None
        }
    }
}

fn overlaps(a: IpNetwork, b: IpNetwork) -> bool {
    a.contains(b.network()) || b.contains(a.network())
}

fn is_dns_subdomain(name: &str) -> bool {
    !name.is_empty() && name.len() <= 253 && DNS_SUBDOMAIN.is_match(name)
}
