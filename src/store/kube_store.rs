//! Store backed by the Kubernetes API server

use super::TenantControlPlaneStore;
use crate::crd::{TenantControlPlane, TenantControlPlaneList};
use crate::error::{Error, Result};
use async_trait::async_trait;
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use std::fmt;
use tracing::debug;

/// TenantControlPlane store using the API server's resourceVersion checks
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeStore")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api(&self, namespace: &str) -> Api<TenantControlPlane> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn identity(object: &TenantControlPlane) -> (String, String) {
    (object.namespace().unwrap_or_default(), object.name_any())
}

fn resource_version(object: &TenantControlPlane) -> Result<String> {
    object
        .resource_version()
        .filter(|rv| !rv.is_empty())
        .ok_or_else(|| {
            let (namespace, name) = identity(object);
            Error::MissingResourceVersion { namespace, name }
        })
}

/// 404 and 409 carry meaning for callers; everything else stays a transport error
fn map_kube_error(err: kube::Error, namespace: &str, name: &str, rv: Option<&str>) -> Error {
    match err {
        kube::Error::Api(e) if e.code == 404 => Error::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(e) if e.code == 409 => Error::Conflict {
            namespace: namespace.to_string(),
            name: name.to_string(),
            resource_version: rv.unwrap_or_default().to_string(),
        },
        other => Error::Kube(other),
    }
}

#[async_trait]
impl TenantControlPlaneStore for KubeStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<TenantControlPlane> {
        self.api(namespace)
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, namespace, name, None))
    }

    async fn list(&self, namespace: Option<&str>) -> Result<TenantControlPlaneList> {
        let api: Api<TenantControlPlane> = match namespace {
            Some(namespace) => self.api(namespace),
            None => Api::all(self.client.clone()),
        };
        let objects = api.list(&ListParams::default()).await?;
        let mut list = TenantControlPlaneList::new(objects.items);
        list.metadata = objects.metadata;
        Ok(list)
    }

    async fn replace_status(&self, object: &TenantControlPlane) -> Result<TenantControlPlane> {
        let (namespace, name) = identity(object);
        let rv = resource_version(object)?;

        // resourceVersion in the patch makes the API server reject stale writes with 409
        let patch = serde_json::json!({
            "metadata": { "resourceVersion": rv },
            "status": object.status,
        });

        debug!(
            resource.name = %name,
            resource.namespace = %namespace,
            resource_version = %rv,
            "patching TenantControlPlane status"
        );

        self.api(&namespace)
            .patch_status(
                &name,
                &PatchParams::apply(&self.field_manager),
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| map_kube_error(e, &namespace, &name, Some(&rv)))
    }

    async fn replace_spec(&self, object: &TenantControlPlane) -> Result<TenantControlPlane> {
        let (namespace, name) = identity(object);
        let rv = resource_version(object)?;

        debug!(
            resource.name = %name,
            resource.namespace = %namespace,
            resource_version = %rv,
            "replacing TenantControlPlane"
        );

        self.api(&namespace)
            .replace(&name, &PostParams::default(), object)
            .await
            .map_err(|e| map_kube_error(e, &namespace, &name, Some(&rv)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "test".to_string(),
            reason: "Test".to_string(),
            code,
        })
    }

    #[test]
    fn test_map_conflict() {
        let err = map_kube_error(api_error(409), "tenants", "alpha", Some("42"));
        assert!(err.is_conflict());
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_map_not_found() {
        let err = map_kube_error(api_error(404), "tenants", "alpha", None);
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_map_other_api_error() {
        let err = map_kube_error(api_error(500), "tenants", "alpha", None);
        assert!(matches!(err, Error::Kube(_)));
        assert!(err.is_transient());
    }
}
