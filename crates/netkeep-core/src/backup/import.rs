// ── Full-site snapshot import ──
//
// Replaces everything under the target site with the snapshot contents.
// Phase 1 wipes the site in dependency order (children before parents);
// phase 2 recreates each group in dependency order, resolving parent
// references through remap tables built as rows are created. Both phases
// run inside one store transaction: a failure anywhere rolls the site
// back to its pre-import state.
//
// Reference-resolution policy: rows that *require* their parent
// (addresses, ranges, services) are skipped when the reference cannot be
// resolved -- lossy but never orphaned. Optional links (subnet->vlan,
// wifi->vlan/subnet, range->scheme entry) degrade to null instead.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::snapshot::Snapshot;
use crate::error::CoreError;
use crate::model::{
    Category, ChangeAction, ChangeEntry, Device, EntityId, IpAddress, IpRange, MacAddress,
    RangeScheme, SchemeEntry, Service, SiteSettings, Subnet, SubnetTemplate, Vlan, WifiNetwork,
};
use crate::store::{MemoryStore, StoreError, StoreState};

/// Per-group record counts for an import.
///
/// Counts reflect the snapshot contents, not rows created: a skipped IP
/// address still counts toward `ip_addresses`. The `skipped` block is
/// the observability companion that separates the two.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub categories: usize,
    pub vlans: usize,
    pub subnets: usize,
    pub devices: usize,
    pub ip_addresses: usize,
    pub ip_ranges: usize,
    pub subnet_templates: usize,
    pub range_schemes: usize,
    pub scheme_entries: usize,
    pub services: usize,
    pub wifi_networks: usize,
    pub site_settings: usize,
    pub change_logs: usize,
    #[serde(default)]
    pub skipped: SkippedCounts,
}

/// Rows dropped because their required parent could not be resolved.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCounts {
    pub ip_addresses: usize,
    pub ip_ranges: usize,
    pub services: usize,
}

pub struct SnapshotImporter {
    store: Arc<MemoryStore>,
    /// Sites with an import in flight. A second import against the same
    /// site is rejected with `Conflict` rather than interleaved.
    active: DashMap<EntityId, ()>,
}

impl SnapshotImporter {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            active: DashMap::new(),
        }
    }

    /// Replace all data under `site_slug` with the snapshot contents.
    pub fn import(
        &self,
        site_slug: &str,
        document: serde_json::Value,
    ) -> Result<ImportCounts, CoreError> {
        let site = self
            .store
            .site_by_slug(site_slug)
            .ok_or_else(|| CoreError::not_found("site", site_slug))?;
        let snapshot = Snapshot::from_value(document)?;

        let _guard = ImportGuard::acquire(&self.active, site.id)?;

        let counts = self
            .store
            .transact(|tx| {
                wipe_site(tx, site.id)?;
                restore_site(tx, site.id, &snapshot)
            })
            .map_err(CoreError::from)?;

        info!(
            site = %site.slug,
            source = %snapshot.site.name,
            devices = counts.devices,
            subnets = counts.subnets,
            "backup import applied"
        );
        Ok(counts)
    }
}

// ── Per-site serialization guard ─────────────────────────────────────

struct ImportGuard<'a> {
    active: &'a DashMap<EntityId, ()>,
    site_id: EntityId,
}

impl<'a> ImportGuard<'a> {
    fn acquire(active: &'a DashMap<EntityId, ()>, site_id: EntityId) -> Result<Self, CoreError> {
        match active.entry(site_id) {
            Entry::Occupied(_) => Err(CoreError::conflict(
                "an import for this site is already in progress",
            )),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(Self { active, site_id })
            }
        }
    }
}

impl Drop for ImportGuard<'_> {
    fn drop(&mut self) {
        self.active.remove(&self.site_id);
    }
}

// ── Phase 1: wipe ────────────────────────────────────────────────────

/// Delete everything under the site, children before parents. The store
/// enforces foreign keys on every step, so getting this order wrong
/// fails immediately instead of orphaning rows.
fn wipe_site(tx: &mut StoreState, site_id: EntityId) -> Result<(), StoreError> {
    tx.delete_change_entries_for_site(site_id);
    // Ranges may point at scheme entries; null the links first so the
    // entries can go.
    tx.detach_ranges_from_schemes(site_id);
    for row in tx.ip_addresses_for_site(site_id) {
        tx.delete_ip_address(row.id)?;
    }
    for range in tx.ip_ranges_for_site(site_id) {
        tx.delete_ip_range(range.id)?;
    }
    for scheme in tx.range_schemes_for_site(site_id) {
        for entry in tx.scheme_entries_for_scheme(scheme.id) {
            tx.delete_scheme_entry(entry.id)?;
        }
        tx.delete_range_scheme(scheme.id)?;
    }
    for template in tx.subnet_templates_for_site(site_id) {
        tx.delete_subnet_template(template.id)?;
    }
    for wifi in tx.wifi_networks_for_site(site_id) {
        tx.delete_wifi_network(wifi.id)?;
    }
    for service in tx.services_for_site(site_id) {
        tx.delete_service(service.id)?;
    }
    for device in tx.devices_for_site(site_id) {
        tx.delete_device(device.id)?;
    }
    for subnet in tx.subnets_for_site(site_id) {
        tx.delete_subnet(subnet.id)?;
    }
    for vlan in tx.vlans_for_site(site_id) {
        tx.delete_vlan(vlan.id)?;
    }
    for category in tx.categories_for_site(site_id) {
        tx.delete_category(category.id)?;
    }
    tx.delete_site_settings(site_id);
    Ok(())
}

// ── Phase 2: ordered recreation ──────────────────────────────────────

#[allow(clippy::too_many_lines)]
fn restore_site(
    tx: &mut StoreState,
    site_id: EntityId,
    snapshot: &Snapshot,
) -> Result<ImportCounts, StoreError> {
    let mut counts = ImportCounts {
        categories: snapshot.categories.len(),
        vlans: snapshot.vlans.len(),
        subnets: snapshot.subnets.len(),
        devices: snapshot.devices.len(),
        ip_addresses: snapshot.ip_addresses.len(),
        ip_ranges: snapshot.ip_ranges.len(),
        subnet_templates: snapshot.subnet_templates.len(),
        range_schemes: snapshot.range_schemes.len(),
        scheme_entries: snapshot.range_schemes.iter().map(|s| s.entries.len()).sum(),
        services: snapshot.services.len(),
        wifi_networks: snapshot.wifi_networks.len(),
        site_settings: usize::from(snapshot.site_settings.is_some()),
        change_logs: snapshot.change_logs.len(),
        skipped: SkippedCounts::default(),
    };

    // 1. Categories -- nothing downstream references them by id.
    for record in &snapshot.categories {
        tx.insert_category(Category {
            id: EntityId::new(),
            site_id,
            name: record.name.clone(),
            description: record.description.clone(),
            icon: record.icon.clone(),
        })?;
    }

    // 2. VLANs.
    let mut vlan_ids: HashMap<String, EntityId> = HashMap::new();
    for record in &snapshot.vlans {
        let created = tx.insert_vlan(Vlan {
            id: EntityId::new(),
            site_id,
            vid: record.vid,
            name: record.name.clone(),
            role: record.role,
            status: record.status,
        })?;
        vlan_ids.insert(record.export_id.clone(), created.id);
    }

    // 3. Subnets. An unmapped VLAN reference degrades to no VLAN.
    let mut subnet_ids: HashMap<String, EntityId> = HashMap::new();
    for record in &snapshot.subnets {
        let vlan_id = record
            .vlan_export_id
            .as_ref()
            .and_then(|eid| vlan_ids.get(eid))
            .copied();
        let created = tx.insert_subnet(Subnet {
            id: EntityId::new(),
            site_id,
            vlan_id,
            prefix: record.prefix.clone(),
            mask: record.mask,
            gateway: record.gateway.clone(),
            role: record.role,
            status: record.status,
        })?;
        subnet_ids.insert(record.export_id.clone(), created.id);
    }

    // 4. Devices.
    let mut device_ids: HashMap<String, EntityId> = HashMap::new();
    for record in &snapshot.devices {
        let created = tx.insert_device(Device {
            id: EntityId::new(),
            site_id,
            name: record.name.clone(),
            mac: record.mac_address.as_deref().map(MacAddress::new),
            ip_address: record.ip_address.clone(),
            category: record.category.clone(),
            status: record.status,
            location: record.location.clone(),
            notes: record.notes.clone(),
        })?;
        device_ids.insert(record.export_id.clone(), created.id);
    }

    // 5. IP addresses. A record without a resolvable subnet is dropped --
    // an orphaned address row is never created.
    for record in &snapshot.ip_addresses {
        let Some(subnet_id) = record
            .subnet_export_id
            .as_ref()
            .and_then(|eid| subnet_ids.get(eid))
            .copied()
        else {
            warn!(address = %record.address, "skipping address with unresolved subnet");
            counts.skipped.ip_addresses += 1;
            continue;
        };
        tx.insert_ip_address(IpAddress {
            id: EntityId::new(),
            site_id,
            subnet_id,
            address: record.address.clone(),
            mask: record.mask,
            status: record.status,
            assigned_to: record.assigned_to.clone(),
            dns_name: record.dns_name.clone(),
            description: record.description.clone(),
        })?;
    }

    // 6. Subnet templates, then schemes with their entries.
    for record in &snapshot.subnet_templates {
        tx.insert_subnet_template(SubnetTemplate {
            id: EntityId::new(),
            site_id,
            name: record.name.clone(),
            mask: record.mask,
            role: record.role,
            description: record.description.clone(),
        })?;
    }
    let mut entry_ids: HashMap<String, EntityId> = HashMap::new();
    for record in &snapshot.range_schemes {
        let scheme = tx.insert_range_scheme(RangeScheme {
            id: EntityId::new(),
            site_id,
            name: record.name.clone(),
            description: record.description.clone(),
        })?;
        for entry in &record.entries {
            let created = tx.insert_scheme_entry(SchemeEntry {
                id: EntityId::new(),
                scheme_id: scheme.id,
                name: entry.name.clone(),
                offset_start: entry.offset_start,
                offset_end: entry.offset_end,
                role: entry.role,
            })?;
            entry_ids.insert(entry.export_id.clone(), created.id);
        }
    }

    // 7. IP ranges. Subnet required (skip), scheme-entry link optional
    // (degrade to null -- the range itself stays valid).
    for record in &snapshot.ip_ranges {
        let Some(subnet_id) = record
            .subnet_export_id
            .as_ref()
            .and_then(|eid| subnet_ids.get(eid))
            .copied()
        else {
            warn!(start = %record.start_addr, "skipping range with unresolved subnet");
            counts.skipped.ip_ranges += 1;
            continue;
        };
        let scheme_entry_id = record
            .scheme_entry_export_id
            .as_ref()
            .and_then(|eid| entry_ids.get(eid))
            .copied();
        tx.insert_ip_range(IpRange {
            id: EntityId::new(),
            site_id,
            subnet_id,
            start_addr: record.start_addr.clone(),
            end_addr: record.end_addr.clone(),
            role: record.role,
            scheme_entry_id,
        })?;
    }

    // 8. Services. Device required.
    for record in &snapshot.services {
        let Some(device_id) = record
            .device_export_id
            .as_ref()
            .and_then(|eid| device_ids.get(eid))
            .copied()
        else {
            warn!(service = %record.name, "skipping service with unresolved device");
            counts.skipped.services += 1;
            continue;
        };
        tx.insert_service(Service {
            id: EntityId::new(),
            site_id,
            device_id,
            name: record.name.clone(),
            protocol: record.protocol,
            ports: record.ports.clone(),
            health: record.health,
            check_url: record.check_url.clone(),
            last_checked: record.last_checked,
        })?;
    }

    // 9. WiFi networks. Both links optional.
    for record in &snapshot.wifi_networks {
        let vlan_id = record
            .vlan_export_id
            .as_ref()
            .and_then(|eid| vlan_ids.get(eid))
            .copied();
        let subnet_id = record
            .subnet_export_id
            .as_ref()
            .and_then(|eid| subnet_ids.get(eid))
            .copied();
        tx.insert_wifi_network(WifiNetwork {
            id: EntityId::new(),
            site_id,
            ssid: record.ssid.clone(),
            security: record.security,
            band: record.band,
            vlan_id,
            subnet_id,
            hidden: record.hidden,
            enabled: record.enabled,
        })?;
    }

    // 10. Site settings.
    if let Some(record) = &snapshot.site_settings {
        tx.insert_site_settings(SiteSettings {
            site_id,
            default_subnet_mask: record.default_subnet_mask,
            changelog_retention: record.changelog_retention,
            notes: record.notes.clone(),
        })?;
    }

    // 11. Change log, verbatim. Object ids are historical text and are
    // deliberately not remapped.
    for record in &snapshot.change_logs {
        tx.insert_change_entry(ChangeEntry {
            id: EntityId::new(),
            site_id,
            object_type: record.object_type.clone(),
            object_id: record.object_id.clone(),
            action: record.action,
            changes: record.changes.clone(),
            timestamp: record.timestamp,
        })?;
    }

    // 12. Mark the import itself.
    tx.append_change(
        site_id,
        "site",
        &site_id.to_string(),
        ChangeAction::Imported,
        json!({
            "sourceSite": snapshot.site.name,
            "exportedAt": snapshot.exported_at,
        }),
    )?;

    Ok(counts)
}
