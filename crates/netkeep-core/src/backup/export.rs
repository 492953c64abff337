// ── Full-site snapshot export ──
//
// Walks one site's object graph under a single read lock and emits the
// groups in a fixed order. Within a group rows are sorted by a natural
// key (name, vid, numeric address) so identical data always produces an
// identical document. Export ids are the store-native ids rendered as
// strings -- the export runs before anything destructive, so no remap
// table is needed on this side.

use std::sync::Arc;

use chrono::Utc;

use super::snapshot::{
    CategoryRecord, ChangeLogRecord, DeviceRecord, IpAddressRecord, IpRangeRecord,
    RangeSchemeRecord, SchemeEntryRecord, ServiceRecord, SettingsRecord, SiteRecord, Snapshot,
    SubnetRecord, SubnetTemplateRecord, VlanRecord, WifiNetworkRecord, SNAPSHOT_VERSION,
};
use crate::addr;
use crate::error::CoreError;
use crate::model::MacAddress;
use crate::store::MemoryStore;

pub struct SnapshotExporter {
    store: Arc<MemoryStore>,
}

impl SnapshotExporter {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn export(&self, site_slug: &str) -> Result<Snapshot, CoreError> {
        let site = self
            .store
            .site_by_slug(site_slug)
            .ok_or_else(|| CoreError::not_found("site", site_slug))?;

        let snapshot = self.store.read(|s| {
            let mut categories = s.categories_for_site(site.id);
            categories.sort_by(|a, b| a.name.cmp(&b.name));

            let mut vlans = s.vlans_for_site(site.id);
            vlans.sort_by_key(|v| v.vid);

            let mut subnets = s.subnets_for_site(site.id);
            subnets.sort_by_key(|sub| (numeric(&sub.prefix), sub.mask));

            let mut devices = s.devices_for_site(site.id);
            devices.sort_by(|a, b| a.name.cmp(&b.name));

            let mut ip_addresses = s.ip_addresses_for_site(site.id);
            ip_addresses.sort_by_key(|a| numeric(&a.address));

            let mut ip_ranges = s.ip_ranges_for_site(site.id);
            ip_ranges.sort_by_key(|r| numeric(&r.start_addr));

            let mut subnet_templates = s.subnet_templates_for_site(site.id);
            subnet_templates.sort_by(|a, b| a.name.cmp(&b.name));

            let mut range_schemes = s.range_schemes_for_site(site.id);
            range_schemes.sort_by(|a, b| a.name.cmp(&b.name));

            let mut services = s.services_for_site(site.id);
            services.sort_by(|a, b| a.name.cmp(&b.name));

            let mut wifi_networks = s.wifi_networks_for_site(site.id);
            wifi_networks.sort_by(|a, b| a.ssid.cmp(&b.ssid));

            let mut change_logs = s.change_entries_for_site(site.id);
            change_logs.sort_by_key(|e| e.timestamp);

            Snapshot {
                version: SNAPSHOT_VERSION.to_owned(),
                exported_at: Utc::now(),
                site: SiteRecord {
                    name: site.name.clone(),
                    slug: site.slug.clone(),
                    description: site.description.clone(),
                },
                site_settings: s.site_settings_for(site.id).map(|st| SettingsRecord {
                    default_subnet_mask: st.default_subnet_mask,
                    changelog_retention: st.changelog_retention,
                    notes: st.notes.clone(),
                }),
                categories: categories
                    .into_iter()
                    .map(|c| CategoryRecord {
                        name: c.name,
                        description: c.description,
                        icon: c.icon,
                    })
                    .collect(),
                vlans: vlans
                    .into_iter()
                    .map(|v| VlanRecord {
                        export_id: v.id.to_string(),
                        vid: v.vid,
                        name: v.name,
                        role: v.role,
                        status: v.status,
                    })
                    .collect(),
                subnets: subnets
                    .into_iter()
                    .map(|sub| SubnetRecord {
                        export_id: sub.id.to_string(),
                        vlan_export_id: sub.vlan_id.map(|id| id.to_string()),
                        prefix: sub.prefix,
                        mask: sub.mask,
                        gateway: sub.gateway,
                        role: sub.role,
                        status: sub.status,
                    })
                    .collect(),
                devices: devices
                    .into_iter()
                    .map(|d| DeviceRecord {
                        export_id: d.id.to_string(),
                        name: d.name,
                        mac_address: d.mac.as_ref().map(MacAddress::to_string),
                        ip_address: d.ip_address,
                        category: d.category,
                        status: d.status,
                        location: d.location,
                        notes: d.notes,
                    })
                    .collect(),
                ip_addresses: ip_addresses
                    .into_iter()
                    .map(|a| IpAddressRecord {
                        subnet_export_id: Some(a.subnet_id.to_string()),
                        address: a.address,
                        mask: a.mask,
                        status: a.status,
                        assigned_to: a.assigned_to,
                        dns_name: a.dns_name,
                        description: a.description,
                    })
                    .collect(),
                ip_ranges: ip_ranges
                    .into_iter()
                    .map(|r| IpRangeRecord {
                        subnet_export_id: Some(r.subnet_id.to_string()),
                        scheme_entry_export_id: r.scheme_entry_id.map(|id| id.to_string()),
                        start_addr: r.start_addr,
                        end_addr: r.end_addr,
                        role: r.role,
                    })
                    .collect(),
                subnet_templates: subnet_templates
                    .into_iter()
                    .map(|t| SubnetTemplateRecord {
                        name: t.name,
                        mask: t.mask,
                        role: t.role,
                        description: t.description,
                    })
                    .collect(),
                range_schemes: range_schemes
                    .into_iter()
                    .map(|scheme| {
                        let mut entries = s.scheme_entries_for_scheme(scheme.id);
                        entries.sort_by_key(|e| e.offset_start);
                        RangeSchemeRecord {
                            name: scheme.name,
                            description: scheme.description,
                            entries: entries
                                .into_iter()
                                .map(|e| SchemeEntryRecord {
                                    export_id: e.id.to_string(),
                                    name: e.name,
                                    offset_start: e.offset_start,
                                    offset_end: e.offset_end,
                                    role: e.role,
                                })
                                .collect(),
                        }
                    })
                    .collect(),
                services: services
                    .into_iter()
                    .map(|svc| ServiceRecord {
                        device_export_id: Some(svc.device_id.to_string()),
                        name: svc.name,
                        protocol: svc.protocol,
                        ports: svc.ports,
                        health: svc.health,
                        check_url: svc.check_url,
                        last_checked: svc.last_checked,
                    })
                    .collect(),
                wifi_networks: wifi_networks
                    .into_iter()
                    .map(|w| WifiNetworkRecord {
                        vlan_export_id: w.vlan_id.map(|id| id.to_string()),
                        subnet_export_id: w.subnet_id.map(|id| id.to_string()),
                        ssid: w.ssid,
                        security: w.security,
                        band: w.band,
                        hidden: w.hidden,
                        enabled: w.enabled,
                    })
                    .collect(),
                change_logs: change_logs
                    .into_iter()
                    .map(|e| ChangeLogRecord {
                        object_type: e.object_type,
                        object_id: e.object_id,
                        action: e.action,
                        changes: e.changes,
                        timestamp: e.timestamp,
                    })
                    .collect(),
            }
        });

        Ok(snapshot)
    }
}

/// Numeric sort key for dotted-quad strings; unparseable strings sort
/// first so they stay visible at the top of a diff.
fn numeric(address: &str) -> u32 {
    addr::to_int(address).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        Device, DeviceState, EntityId, IpAddress, IpStatus, NetworkRole, Site, Subnet, Vlan,
        VlanStatus,
    };

    fn seeded_store() -> (Arc<MemoryStore>, EntityId) {
        let store = Arc::new(MemoryStore::new());
        let site = store
            .transact(|tx| {
                tx.insert_site(Site {
                    id: EntityId::new(),
                    name: "Home".into(),
                    slug: "home".into(),
                    description: None,
                })
            })
            .unwrap();
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
                let subnet = tx.insert_subnet(Subnet {
                    id: EntityId::new(),
                    site_id: site.id,
                    vlan_id: Some(vlan.id),
                    prefix: "10.0.10.0".into(),
                    mask: 24,
                    gateway: Some("10.0.10.1".into()),
                    role: NetworkRole::Lan,
                    status: VlanStatus::Active,
                })?;
                tx.insert_ip_address(IpAddress {
                    id: EntityId::new(),
                    site_id: site.id,
                    subnet_id: subnet.id,
                    address: "10.0.10.5".into(),
                    mask: 24,
                    status: IpStatus::Active,
                    assigned_to: Some("nas".into()),
                    dns_name: Some("nas".into()),
                    description: None,
                })?;
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
                })?;
                Ok(())
            })
            .unwrap();
        (store, site.id)
    }

    #[test]
    fn export_substitutes_export_ids_for_foreign_keys() {
        let (store, _) = seeded_store();
        let exporter = SnapshotExporter::new(Arc::clone(&store));
        let snapshot = exporter.export("home").unwrap();

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.vlans.len(), 1);
        assert_eq!(
            snapshot.subnets[0].vlan_export_id.as_deref(),
            Some(snapshot.vlans[0].export_id.as_str()),
            "subnet references its VLAN by export id"
        );
        assert_eq!(
            snapshot.ip_addresses[0].subnet_export_id.as_deref(),
            Some(snapshot.subnets[0].export_id.as_str())
        );
    }

    #[test]
    fn export_is_deterministic_for_identical_data() {
        let (store, _) = seeded_store();
        let exporter = SnapshotExporter::new(Arc::clone(&store));
        let mut a = serde_json::to_value(exporter.export("home").unwrap()).unwrap();
        let mut b = serde_json::to_value(exporter.export("home").unwrap()).unwrap();
        // The wall-clock stamp is the only allowed difference.
        a.as_object_mut().unwrap().remove("exportedAt");
        b.as_object_mut().unwrap().remove("exportedAt");
        assert_eq!(a, b);
    }

    #[test]
    fn export_of_unknown_site_is_not_found() {
        let (store, _) = seeded_store();
        let exporter = SnapshotExporter::new(store);
        assert!(matches!(
            exporter.export("nope").unwrap_err(),
            CoreError::NotFound { .. }
        ));
    }
}
