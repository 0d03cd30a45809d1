//! In-memory store with the same compare-and-swap semantics as the API server

use super::TenantControlPlaneStore;
use crate::crd::{TenantControlPlane, TenantControlPlaneList};
use crate::error::{Error, Result};
use async_trait::async_trait;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Key = (String, String);

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<Key, TenantControlPlane>,
    last_version: u64,
}

impl State {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }
}

/// Versioned object store held in process memory.
///
/// Each successful write assigns a new, strictly increasing resource version.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|e| Error::Lock(e.to_string()))
    }

    /// Create an object, assigning its first resource version
    pub fn create(&self, object: TenantControlPlane) -> Result<TenantControlPlane> {
        let key = key_of(&object);
        let mut state = self.lock()?;
        if state.objects.contains_key(&key) {
            return Err(Error::Conflict {
                namespace: key.0,
                name: key.1,
                resource_version: String::new(),
            });
        }

        let mut stored = object;
        stored.metadata.resource_version = Some(state.next_version());
        stored.metadata.generation = Some(1);
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }

    /// Remove an object; returns it if it existed
    pub fn delete(&self, namespace: &str, name: &str) -> Result<Option<TenantControlPlane>> {
        let mut state = self.lock()?;
        Ok(state
            .objects
            .remove(&(namespace.to_string(), name.to_string())))
    }

    /// Swap in `update(stored)` when `object`'s resource version matches the stored one
    fn compare_and_swap(
        &self,
        object: &TenantControlPlane,
        update: impl FnOnce(&TenantControlPlane, &TenantControlPlane) -> TenantControlPlane,
    ) -> Result<TenantControlPlane> {
        let key = key_of(object);
        let Some(expected) = object.resource_version().filter(|rv| !rv.is_empty()) else {
            return Err(Error::MissingResourceVersion {
                namespace: key.0,
                name: key.1,
            });
        };

        let mut state = self.lock()?;
        let Some(stored) = state.objects.get(&key) else {
            return Err(Error::NotFound {
                namespace: key.0,
                name: key.1,
            });
        };
        if stored.resource_version().as_deref() != Some(expected.as_str()) {
            return Err(Error::Conflict {
                namespace: key.0,
                name: key.1,
                resource_version: expected,
            });
        }

        let mut updated = update(stored, object);
        updated.metadata.resource_version = Some(state.next_version());
        state.objects.insert(key, updated.clone());
        Ok(updated)
    }
}

fn key_of(object: &TenantControlPlane) -> Key {
    (object.namespace().unwrap_or_default(), object.name_any())
}

#[async_trait]
impl TenantControlPlaneStore for InMemoryStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<TenantControlPlane> {
        let state = self.lock()?;
        state
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list(&self, namespace: Option<&str>) -> Result<TenantControlPlaneList> {
        let state = self.lock()?;
        let items = state
            .objects
            .iter()
            .filter(|((ns, _), _)| namespace.is_none_or(|wanted| wanted == ns))
            .map(|(_, object)| object.clone())
            .collect();
        let mut list = TenantControlPlaneList::new(items);
        list.metadata.resource_version = Some(state.last_version.to_string());
        Ok(list)
    }

    async fn replace_status(&self, object: &TenantControlPlane) -> Result<TenantControlPlane> {
        // Status writes never touch spec or metadata
        self.compare_and_swap(object, |stored, incoming| {
            let mut updated = stored.clone();
            updated.status = incoming.status.clone();
            updated
        })
    }

    async fn replace_spec(&self, object: &TenantControlPlane) -> Result<TenantControlPlane> {
        // Spec writes never touch status
        self.compare_and_swap(object, |stored, incoming| {
            let mut updated = incoming.clone();
            updated.status = stored.status.clone();
            updated.metadata.uid = stored.metadata.uid.clone();
            let generation = stored.metadata.generation.unwrap_or(1);
            updated.metadata.generation = Some(if incoming.spec == stored.spec {
                generation
            } else {
                generation + 1
            });
            updated
        })
    }
}
