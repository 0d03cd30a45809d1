//! # Scheme
//!
//! Decoding manifests through an explicitly built scheme, as a client would
//! before evaluating a TenantControlPlane offline.

mod common;

use tenant_control_plane::convergence::refresh;
use tenant_control_plane::crd::{KubernetesVersionStatus, TenantControlPlane, TenantControlPlaneList};
use tenant_control_plane::scheme::{add_to_scheme, Format, Scheme};
use tenant_control_plane::Error;

const MANIFEST: &str = r#"
apiVersion: kamaji.clastix.io/v1alpha1
kind: TenantControlPlane
metadata:
  name: alpha
  namespace: tenants
spec:
  controlPlane:
    deployment:
      replicas: 3
    service:
      serviceType: NodePort
    ingress:
      enabled: true
  kubernetes:
    version: v1.30.2
    admissionControllers:
      - ResourceQuota
      - LimitRanger
  networkProfile:
    address: 192.168.1.10
    domain: tenants.example.com
    serviceCidr: 10.96.0.0/16
    podCidr: 10.244.0.0/16
    dnsServiceIPs:
      - 10.96.0.10
  addons:
    kubeProxy:
      enabled: false
"#;

fn scheme() -> Scheme {
    add_to_scheme(Scheme::builder()).build()
}

#[test]
fn test_decode_and_evaluate_manifest() {
    let mut tcp: TenantControlPlane = scheme().decode(MANIFEST).unwrap();
    assert_eq!(tcp.desired_replicas(), 3);
    assert_eq!(
        tcp.spec.kubernetes.admission_controllers.to_flag_value(),
        "LimitRanger,ResourceQuota"
    );
    assert_eq!(
        tcp.ingress_host().as_deref(),
        Some("alpha.tenants.tenants.example.com")
    );
    assert!(!tcp.spec.addons.kube_proxy.enabled);

    let readiness = refresh(&mut tcp, common::at(0));
    assert_eq!(readiness.status, KubernetesVersionStatus::Provisioning);
    assert_eq!(
        tcp.status.unwrap().control_plane_endpoint.as_deref(),
        Some("192.168.1.10:6443")
    );
}

#[test]
fn test_encode_yaml_decodes_back() {
    let scheme = scheme();
    let tcp: TenantControlPlane = scheme.decode(MANIFEST).unwrap();
    let yaml = scheme.encode(&tcp, Format::Yaml).unwrap();
    let back: TenantControlPlane = scheme.decode(&yaml).unwrap();
    assert_eq!(back, tcp);
}

#[test]
fn test_list_round_trip() {
    let scheme = scheme();
    let tcp: TenantControlPlane = scheme.decode(MANIFEST).unwrap();
    let list = TenantControlPlaneList::new(vec![tcp]);

    let json = scheme.encode(&list, Format::Json).unwrap();
    let kind = scheme.kind_of(&json).unwrap();
    assert_eq!(kind.kind, "TenantControlPlaneList");

    let back: TenantControlPlaneList = scheme.decode(&json).unwrap();
    assert_eq!(back.items.len(), 1);
}

#[test]
fn test_unregistered_scheme_refuses_to_encode() {
    let tcp: TenantControlPlane = scheme().decode(MANIFEST).unwrap();
    let err = Scheme::default().encode(&tcp, Format::Json).unwrap_err();
    assert!(matches!(err, Error::UnregisteredKind { .. }));
}
