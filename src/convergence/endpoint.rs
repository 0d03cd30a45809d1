//! Control plane endpoint derivation

use crate::crd::TenantControlPlane;
use std::net::Ipv6Addr;

/// `host:port` where the tenant API server is reachable, once it can be known.
///
/// The host is the configured address, or the address a load balancer assigned
/// to the Service. The port is the live Service port, falling back to the spec.
pub fn derive_endpoint(tcp: &TenantControlPlane) -> Option<String> {
    let profile = &tcp.spec.network_profile;
    let service = tcp
        .status
        .as_ref()
        .and_then(|status| status.kubernetes_resources.service.as_ref());

    let host = profile
        .address()
        .or_else(|| service.and_then(|service| service.load_balancer_address()))?;

    let port = service
        .map(|service| service.port)
        .filter(|port| *port > 0)
        .unwrap_or(profile.port);

    Some(join_host_port(host, port))
}

fn join_host_port(host: &str, port: i32) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
