// ── Auto-link reconciliation ──
//
// Keeps Device.ip_address and the authoritative IpAddress records
// mutually consistent on every device create/update/delete, and cleans
// up device references when subnets or address records go away.
//
// Reconciliation is a best-effort follow-up to the device mutation
// itself: callers log failures and never surface them as a failure of
// the device operation. Each operation here runs in its own store
// transaction, so a failing step leaves no half-applied link behind.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::addr;
use crate::error::CoreError;
use crate::model::{Device, EntityId, IpAddress, IpStatus};
use crate::store::{MemoryStore, StoreError, StoreState};

/// The reconciliation engine.
///
/// When more than one subnet could contain an address (overlapping
/// prefixes), the first subnet in store enumeration order wins. The
/// reference store enumerates in insertion order; the policy is
/// deliberate-but-arbitrary, not an error.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<MemoryStore>,
}

impl Reconciler {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Link a newly created device's address into the IPAM inventory.
    ///
    /// No subnet containing the address is a silent no-op: the free-text
    /// field simply stays unlinked.
    pub fn device_created(&self, device: &Device) -> Result<(), CoreError> {
        if device.ip_address.is_empty() {
            return Ok(());
        }
        let ip = addr::to_int(&device.ip_address)?;
        self.store
            .transact(|tx| link_address(tx, device, &device.ip_address, ip))
            .map_err(CoreError::from)
    }

    /// React to a device's address changing. A call where nothing changed
    /// is a no-op -- no unlink/relink cycle.
    pub fn device_updated(
        &self,
        device: &Device,
        old_ip: &str,
        new_ip: &str,
    ) -> Result<(), CoreError> {
        if old_ip == new_ip {
            return Ok(());
        }
        if !old_ip.is_empty() {
            self.store
                .transact(|tx| unlink_address(tx, device.site_id, old_ip, &device.name))?;
        }
        if new_ip.is_empty() {
            return Ok(());
        }
        let ip = addr::to_int(new_ip)?;
        self.store
            .transact(|tx| link_address(tx, device, new_ip, ip))
            .map_err(CoreError::from)
    }

    /// Unlink (never delete) the address record a deleted device held.
    pub fn device_deleted(&self, device: &Device) -> Result<(), CoreError> {
        if device.ip_address.is_empty() {
            return Ok(());
        }
        self.store
            .transact(|tx| unlink_address(tx, device.site_id, &device.ip_address, &device.name))
            .map_err(CoreError::from)
    }

    /// Cascade a subnet deletion: clear the free-text address on devices
    /// that matched one of the subnet's records, then remove the records
    /// and the subnet itself.
    pub fn subnet_deleted(&self, site_id: EntityId, subnet_id: EntityId) -> Result<(), CoreError> {
        self.store
            .transact(|tx| {
                if !tx.subnet(subnet_id).is_some_and(|s| s.site_id == site_id) {
                    return Err(StoreError::missing("subnet", subnet_id));
                }
                let rows = tx.ip_addresses_for_subnet(subnet_id);
                let ranges = tx.ip_ranges_for_subnet(subnet_id);
                let row_addresses: HashSet<&str> =
                    rows.iter().map(|r| r.address.as_str()).collect();

                for mut device in tx.devices_for_site(site_id) {
                    if !device.ip_address.is_empty()
                        && row_addresses.contains(device.ip_address.as_str())
                    {
                        device.ip_address.clear();
                        tx.update_device(device)?;
                    }
                }
                for row in rows {
                    tx.delete_ip_address(row.id)?;
                }
                for range in ranges {
                    tx.delete_ip_range(range.id)?;
                }
                tx.delete_subnet(subnet_id)?;
                Ok(())
            })
            .map_err(CoreError::from)
    }

    /// Delete an address record and clear the free-text field on any
    /// device that pointed at it. Returns the removed record.
    pub fn ip_address_deleted(
        &self,
        site_id: EntityId,
        address_id: EntityId,
    ) -> Result<IpAddress, CoreError> {
        self.store
            .transact(|tx| {
                let removed = tx.delete_ip_address(address_id)?;
                if removed.site_id != site_id {
                    // Rolls back the delete: the id belongs to another site.
                    return Err(StoreError::missing("ip_address", address_id));
                }
                for mut device in tx.devices_for_site(site_id) {
                    if device.ip_address == removed.address {
                        device.ip_address.clear();
                        tx.update_device(device)?;
                    }
                }
                Ok(removed)
            })
            .map_err(CoreError::from)
    }
}

/// Find the first subnet containing `ip` and link-or-create the matching
/// address record. Subnets whose prefix fails to parse are skipped.
fn link_address(
    tx: &mut StoreState,
    device: &Device,
    address: &str,
    ip: u32,
) -> Result<(), StoreError> {
    let target = tx.subnets_for_site(device.site_id).into_iter().find(|s| {
        match addr::to_int(&s.prefix) {
            Ok(base) => {
                let mask = addr::mask_bits(s.mask);
                (ip & mask) == (base & mask)
            }
            Err(_) => {
                warn!(subnet = %s.cidr(), "skipping subnet with unparseable prefix");
                false
            }
        }
    });
    let Some(subnet) = target else {
        return Ok(());
    };

    match tx.ip_address_in_subnet(subnet.id, address).cloned() {
        Some(mut row) => {
            row.assigned_to = Some(device.name.clone());
            row.dns_name = Some(device.name.clone());
            tx.update_ip_address(row)
        }
        None => tx
            .insert_ip_address(IpAddress {
                id: EntityId::new(),
                site_id: device.site_id,
                subnet_id: subnet.id,
                address: address.to_owned(),
                mask: subnet.mask,
                status: IpStatus::Active,
                assigned_to: Some(device.name.clone()),
                dns_name: Some(device.name.clone()),
                description: None,
            })
            .map(|_| ()),
    }
}

/// Clear the assignment on the record a device held, keeping the record.
fn unlink_address(
    tx: &mut StoreState,
    site_id: EntityId,
    address: &str,
    device_name: &str,
) -> Result<(), StoreError> {
    if let Some(mut row) = tx.ip_address_assigned(site_id, address, device_name).cloned() {
        row.assigned_to = None;
        row.description = None;
        tx.update_ip_address(row)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceState, NetworkRole, Site, Subnet, VlanStatus};
    use pretty_assertions::assert_eq;

    fn store_with_subnet() -> (Arc<MemoryStore>, EntityId, EntityId) {
        let store = Arc::new(MemoryStore::new());
        let site = store
            .transact(|tx| {
                tx.insert_site(Site {
                    id: EntityId::new(),
                    name: "Lab".into(),
                    slug: "lab".into(),
                    description: None,
                })
            })
            .unwrap();
        let subnet = store
            .transact(|tx| {
                tx.insert_subnet(Subnet {
                    id: EntityId::new(),
                    site_id: site.id,
                    vlan_id: None,
                    prefix: "10.0.10.0".into(),
                    mask: 24,
                    gateway: None,
                    role: NetworkRole::Lan,
                    status: VlanStatus::Active,
                })
            })
            .unwrap();
        (store, site.id, subnet.id)
    }

    fn device(site_id: EntityId, name: &str, ip: &str) -> Device {
        Device {
            id: EntityId::new(),
            site_id,
            name: name.into(),
            mac: None,
            ip_address: ip.into(),
            category: None,
            status: DeviceState::Active,
            location: None,
            notes: None,
        }
    }

    #[test]
    fn created_device_gets_linked_record() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));
        let dev = device(site_id, "nas", "10.0.10.99");

        reconciler.device_created(&dev).unwrap();

        let rows = store.read(|s| s.ip_addresses_for_subnet(subnet_id));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].address, "10.0.10.99");
        assert_eq!(rows[0].assigned_to.as_deref(), Some("nas"));
        assert_eq!(rows[0].dns_name.as_deref(), Some("nas"));
        assert_eq!(rows[0].status, IpStatus::Active);
    }

    #[test]
    fn created_device_links_existing_record_instead_of_erroring() {
        let (store, site_id, subnet_id) = store_with_subnet();
        store
            .transact(|tx| {
                tx.insert_ip_address(IpAddress {
                    id: EntityId::new(),
                    site_id,
                    subnet_id,
                    address: "10.0.10.50".into(),
                    mask: 24,
                    status: IpStatus::Reserved,
                    assigned_to: None,
                    dns_name: None,
                    description: None,
                })
            })
            .unwrap();

        let reconciler = Reconciler::new(Arc::clone(&store));
        reconciler
            .device_created(&device(site_id, "printer", "10.0.10.50"))
            .unwrap();

        let rows = store.read(|s| s.ip_addresses_for_subnet(subnet_id));
        assert_eq!(rows.len(), 1, "no second row for the same address");
        assert_eq!(rows[0].assigned_to.as_deref(), Some("printer"));
    }

    #[test]
    fn address_outside_every_subnet_is_a_silent_noop() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));

        reconciler
            .device_created(&device(site_id, "router", "192.168.50.1"))
            .unwrap();

        assert!(store.read(|s| s.ip_addresses_for_subnet(subnet_id)).is_empty());
    }

    #[test]
    fn malformed_address_errors_without_touching_store() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));

        let err = reconciler
            .device_created(&device(site_id, "bad", "10.0.10"))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAddress { .. }));
        assert!(store.read(|s| s.ip_addresses_for_subnet(subnet_id)).is_empty());
    }

    #[test]
    fn update_with_unchanged_address_is_a_noop() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));
        let dev = device(site_id, "nas", "10.0.10.5");
        reconciler.device_created(&dev).unwrap();

        reconciler
            .device_updated(&dev, "10.0.10.5", "10.0.10.5")
            .unwrap();

        let rows = store.read(|s| s.ip_addresses_for_subnet(subnet_id));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].assigned_to.as_deref(), Some("nas"));
    }

    #[test]
    fn update_moves_the_link() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));
        let mut dev = device(site_id, "nas", "10.0.10.5");
        reconciler.device_created(&dev).unwrap();

        dev.ip_address = "10.0.10.6".into();
        reconciler
            .device_updated(&dev, "10.0.10.5", "10.0.10.6")
            .unwrap();

        let rows = store.read(|s| s.ip_addresses_for_subnet(subnet_id));
        assert_eq!(rows.len(), 2);
        let old = rows.iter().find(|r| r.address == "10.0.10.5").unwrap();
        let new = rows.iter().find(|r| r.address == "10.0.10.6").unwrap();
        assert_eq!(old.assigned_to, None, "old record unlinked, not deleted");
        assert_eq!(new.assigned_to.as_deref(), Some("nas"));
    }

    #[test]
    fn deleted_device_unlinks_but_keeps_record() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));
        let dev = device(site_id, "cam", "10.0.10.99");
        reconciler.device_created(&dev).unwrap();

        reconciler.device_deleted(&dev).unwrap();

        let rows = store.read(|s| s.ip_addresses_for_subnet(subnet_id));
        assert_eq!(rows.len(), 1, "record survives the device");
        assert_eq!(rows[0].assigned_to, None);
    }

    #[test]
    fn subnet_deletion_clears_matching_devices() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));
        let dev = device(site_id, "nas", "10.0.10.5");
        let stored = store.transact(|tx| tx.insert_device(dev.clone())).unwrap();
        reconciler.device_created(&stored).unwrap();

        reconciler.subnet_deleted(site_id, subnet_id).unwrap();

        let devices = store.devices_for_site(site_id);
        assert_eq!(devices[0].ip_address, "");
        assert!(store.read(|s| s.subnet(subnet_id).is_none()));
    }

    #[test]
    fn address_deletion_clears_referencing_devices() {
        let (store, site_id, subnet_id) = store_with_subnet();
        let reconciler = Reconciler::new(Arc::clone(&store));
        let stored = store
            .transact(|tx| tx.insert_device(device(site_id, "nas", "10.0.10.5")))
            .unwrap();
        reconciler.device_created(&stored).unwrap();
        let row_id = store.read(|s| s.ip_addresses_for_subnet(subnet_id))[0].id;

        reconciler.ip_address_deleted(site_id, row_id).unwrap();

        assert_eq!(store.devices_for_site(site_id)[0].ip_address, "");
        assert!(store.read(|s| s.ip_addresses_for_subnet(subnet_id)).is_empty());
    }

    #[test]
    fn overlapping_subnets_first_in_enumeration_order_wins() {
        let (store, site_id, first_subnet) = store_with_subnet();
        // Second, wider subnet also containing 10.0.10.x.
        store
            .transact(|tx| {
                tx.insert_subnet(Subnet {
                    id: EntityId::new(),
                    site_id,
                    vlan_id: None,
                    prefix: "10.0.0.0".into(),
                    mask: 16,
                    gateway: None,
                    role: NetworkRole::Lan,
                    status: VlanStatus::Active,
                })
            })
            .unwrap();

        let reconciler = Reconciler::new(Arc::clone(&store));
        reconciler
            .device_created(&device(site_id, "nas", "10.0.10.7"))
            .unwrap();

        let rows = store.read(|s| s.ip_addresses_for_subnet(first_subnet));
        assert_eq!(rows.len(), 1, "record lands in the earliest-created subnet");
    }
}
