//! End-to-end backup round trip: seed a site through the reconciliation
//! engine, export it, and replay the snapshot into an empty site.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use netkeep_core::model::{
    Device, DeviceState, EntityId, NetworkRole, Site, Subnet, Vlan, VlanStatus,
};
use netkeep_core::{MemoryStore, Reconciler, SnapshotExporter, SnapshotImporter};

fn new_site(store: &MemoryStore, slug: &str, name: &str) -> Site {
    store
        .transact(|tx| {
            tx.insert_site(Site {
                id: EntityId::new(),
                name: name.into(),
                slug: slug.into(),
                description: None,
            })
        })
        .unwrap()
}

/// Build the scenario site: VLAN 10, subnet 10.0.10.0/24 on it, and one
/// device whose address auto-links an IPAM record.
fn seed(store: &Arc<MemoryStore>, site: &Site) {
    let reconciler = Reconciler::new(Arc::clone(store));
    store
        .transact(|tx| {
            let vlan = tx.insert_vlan(Vlan {
                id: EntityId::new(),
                site_id: site.id,
                vid: 10,
                name: "users".into(),
                role: NetworkRole::Lan,
                status: VlanStatus::Active,
            })?;
            tx.insert_subnet(Subnet {
                id: EntityId::new(),
                site_id: site.id,
                vlan_id: Some(vlan.id),
                prefix: "10.0.10.0".into(),
                mask: 24,
                gateway: Some("10.0.10.1".into()),
                role: NetworkRole::Lan,
                status: VlanStatus::Active,
            })?;
            Ok(())
        })
        .unwrap();

    let device = store
        .transact(|tx| {
            tx.insert_device(Device {
                id: EntityId::new(),
                site_id: site.id,
                name: "nas".into(),
                mac: None,
                ip_address: "10.0.10.5".into(),
                category: None,
                status: DeviceState::Active,
                location: None,
                notes: None,
            })
        })
        .unwrap();
    reconciler.device_created(&device).unwrap();
}

#[test]
fn export_then_import_preserves_the_object_graph() {
    let store = Arc::new(MemoryStore::new());
    let source = new_site(&store, "source", "Source");
    let target = new_site(&store, "target", "Target");
    seed(&store, &source);

    let snapshot = SnapshotExporter::new(Arc::clone(&store))
        .export("source")
        .unwrap();
    let document = serde_json::to_value(&snapshot).unwrap();

    let counts = SnapshotImporter::new(Arc::clone(&store))
        .import("target", document)
        .unwrap();
    assert_eq!(counts.vlans, 1);
    assert_eq!(counts.subnets, 1);
    assert_eq!(counts.devices, 1);
    assert_eq!(counts.ip_addresses, 1);
    assert_eq!(counts.skipped.ip_addresses, 0);

    store.read(|s| {
        let vlans = s.vlans_for_site(target.id);
        let subnets = s.subnets_for_site(target.id);
        let devices = s.devices_for_site(target.id);

        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[0].vid, 10);
        assert_eq!(subnets.len(), 1);
        assert_eq!(subnets[0].vlan_id, Some(vlans[0].id));
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip_address, "10.0.10.5");

        let addresses = s.ip_addresses_for_subnet(subnets[0].id);
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].assigned_to.as_deref(), Some("nas"));
    });

    // The source site is untouched by importing elsewhere.
    store.read(|s| {
        assert_eq!(s.devices_for_site(source.id).len(), 1);
    });
}

#[test]
fn reimporting_the_same_snapshot_replaces_rather_than_duplicates() {
    let store = Arc::new(MemoryStore::new());
    let site = new_site(&store, "main", "Main");
    seed(&store, &site);

    let snapshot = SnapshotExporter::new(Arc::clone(&store))
        .export("main")
        .unwrap();
    let document = serde_json::to_value(&snapshot).unwrap();

    let importer = SnapshotImporter::new(Arc::clone(&store));
    importer.import("main", document.clone()).unwrap();
    importer.import("main", document).unwrap();

    store.read(|s| {
        assert_eq!(s.vlans_for_site(site.id).len(), 1);
        assert_eq!(s.subnets_for_site(site.id).len(), 1);
        assert_eq!(s.devices_for_site(site.id).len(), 1);
        assert_eq!(s.ip_addresses_for_site(site.id).len(), 1);
    });
}
