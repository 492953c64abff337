// ── In-memory reference store ──
//
// Single RwLock over the whole table state. Reads take the shared lock;
// writes go through `transact`, which snapshots the state first and
// restores it if the closure errs, giving every multi-step mutation
// all-or-nothing semantics.

use std::sync::{PoisonError, RwLock};

use super::tables::StoreState;
use super::StoreError;
use crate::model::{Device, EntityId, Site, Subnet};

/// The reference storage backend.
///
/// A real deployment would sit this API on a relational database; the
/// engine only relies on the contract exercised here (FK enforcement,
/// unique keys, transactional rollback).
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only closure against the current state.
    pub fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run a mutating closure as one transaction. If the closure returns
    /// an error the state is restored to what it was before the call.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let checkpoint = guard.clone();
        match f(&mut guard) {
            Ok(value) => Ok(value),
            Err(err) => {
                *guard = checkpoint;
                Err(err)
            }
        }
    }

    // ── Site helpers ─────────────────────────────────────────────────

    pub fn site_by_slug(&self, slug: &str) -> Option<Site> {
        self.read(|s| s.site_by_slug(slug).cloned())
    }

    /// Fetch the site with this slug, creating it if absent. Used at
    /// server startup so the configured site always exists.
    pub fn ensure_site(&self, slug: &str, name: &str) -> Result<Site, StoreError> {
        if let Some(site) = self.site_by_slug(slug) {
            return Ok(site);
        }
        self.transact(|tx| {
            tx.insert_site(Site {
                id: EntityId::new(),
                name: name.to_owned(),
                slug: slug.to_owned(),
                description: None,
            })
        })
    }

    // ── Frequently used accessors ────────────────────────────────────

    pub fn device(&self, id: EntityId) -> Option<Device> {
        self.read(|s| s.device(id).cloned())
    }

    pub fn devices_for_site(&self, site_id: EntityId) -> Vec<Device> {
        self.read(|s| s.devices_for_site(site_id))
    }

    pub fn subnets_for_site(&self, site_id: EntityId) -> Vec<Subnet> {
        self.read(|s| s.subnets_for_site(site_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceState, NetworkRole, VlanStatus};

    #[test]
    fn transact_rolls_back_on_error() {
        let store = MemoryStore::new();
        let site = store.ensure_site("lab", "Lab").unwrap();

        let result: Result<(), StoreError> = store.transact(|tx| {
            tx.insert_device(Device {
                id: EntityId::new(),
                site_id: site.id,
                name: "will-vanish".into(),
                mac: None,
                ip_address: String::new(),
                category: None,
                status: DeviceState::Active,
                location: None,
                notes: None,
            })?;
            Err(StoreError::Integrity {
                message: "forced".into(),
            })
        });

        assert!(result.is_err());
        assert!(store.devices_for_site(site.id).is_empty());
    }

    #[test]
    fn transact_commits_on_success() {
        let store = MemoryStore::new();
        let site = store.ensure_site("lab", "Lab").unwrap();

        store
            .transact(|tx| {
                tx.insert_subnet(Subnet {
                    id: EntityId::new(),
                    site_id: site.id,
                    vlan_id: None,
                    prefix: "10.0.0.0".into(),
                    mask: 24,
                    gateway: None,
                    role: NetworkRole::Lan,
                    status: VlanStatus::Active,
                })
            })
            .unwrap();

        assert_eq!(store.subnets_for_site(site.id).len(), 1);
    }

    #[test]
    fn ensure_site_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.ensure_site("main", "Main").unwrap();
        let b = store.ensure_site("main", "Renamed").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.name, "Main");
    }
}
