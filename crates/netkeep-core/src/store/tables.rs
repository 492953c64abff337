// ── Table state and relational rules ──
//
// One `IndexMap` per entity kind, insertion-ordered so enumeration is
// deterministic (subnet scan order during reconciliation is "first
// created wins"). All foreign-key and unique-key rules live here, on the
// mutating methods, so a transaction sees exactly the checks a real
// relational backend would apply.

use chrono::Utc;
use indexmap::IndexMap;

use super::StoreError;
use crate::addr;
use crate::model::{
    Category, ChangeAction, ChangeEntry, Device, EntityId, IpAddress, IpRange, RangeScheme,
    SchemeEntry, Service, Site, SiteSettings, Subnet, SubnetTemplate, Vlan, WifiNetwork,
};

/// The full table state. Cloned wholesale by `MemoryStore::transact` to
/// implement rollback.
#[derive(Debug, Default, Clone)]
pub struct StoreState {
    sites: IndexMap<EntityId, Site>,
    categories: IndexMap<EntityId, Category>,
    vlans: IndexMap<EntityId, Vlan>,
    subnets: IndexMap<EntityId, Subnet>,
    subnet_templates: IndexMap<EntityId, SubnetTemplate>,
    ip_addresses: IndexMap<EntityId, IpAddress>,
    ip_ranges: IndexMap<EntityId, IpRange>,
    range_schemes: IndexMap<EntityId, RangeScheme>,
    scheme_entries: IndexMap<EntityId, SchemeEntry>,
    devices: IndexMap<EntityId, Device>,
    services: IndexMap<EntityId, Service>,
    wifi_networks: IndexMap<EntityId, WifiNetwork>,
    /// Keyed by site id -- at most one row per site.
    site_settings: IndexMap<EntityId, SiteSettings>,
    change_log: IndexMap<EntityId, ChangeEntry>,
}

impl StoreState {
    // ── Sites ────────────────────────────────────────────────────────

    pub fn insert_site(&mut self, mut site: Site) -> Result<Site, StoreError> {
        if self.sites.values().any(|s| s.slug == site.slug) {
            return Err(StoreError::Duplicate {
                entity: "site",
                key: site.slug,
            });
        }
        site.id = EntityId::new();
        self.sites.insert(site.id, site.clone());
        Ok(site)
    }

    pub fn site(&self, id: EntityId) -> Option<&Site> {
        self.sites.get(&id)
    }

    pub fn site_by_slug(&self, slug: &str) -> Option<&Site> {
        self.sites.values().find(|s| s.slug == slug)
    }

    fn require_site(&self, entity: &'static str, id: EntityId) -> Result<(), StoreError> {
        if self.sites.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::foreign_key(entity, "site", id))
        }
    }

    // ── Categories ───────────────────────────────────────────────────

    pub fn insert_category(&mut self, mut category: Category) -> Result<Category, StoreError> {
        self.require_site("category", category.site_id)?;
        category.id = EntityId::new();
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub fn delete_category(&mut self, id: EntityId) -> Result<Category, StoreError> {
        self.categories
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("category", id))
    }

    pub fn categories_for_site(&self, site_id: EntityId) -> Vec<Category> {
        self.categories
            .values()
            .filter(|c| c.site_id == site_id)
            .cloned()
            .collect()
    }

    // ── VLANs ────────────────────────────────────────────────────────

    pub fn insert_vlan(&mut self, mut vlan: Vlan) -> Result<Vlan, StoreError> {
        self.require_site("vlan", vlan.site_id)?;
        if !(1..=4094).contains(&vlan.vid) {
            return Err(StoreError::Integrity {
                message: format!("vlan id {} outside 1-4094", vlan.vid),
            });
        }
        if self
            .vlans
            .values()
            .any(|v| v.site_id == vlan.site_id && v.vid == vlan.vid)
        {
            return Err(StoreError::Duplicate {
                entity: "vlan",
                key: format!("vid {}", vlan.vid),
            });
        }
        vlan.id = EntityId::new();
        self.vlans.insert(vlan.id, vlan.clone());
        Ok(vlan)
    }

    pub fn vlan(&self, id: EntityId) -> Option<&Vlan> {
        self.vlans.get(&id)
    }

    pub fn delete_vlan(&mut self, id: EntityId) -> Result<Vlan, StoreError> {
        if self.subnets.values().any(|s| s.vlan_id == Some(id)) {
            return Err(StoreError::foreign_key("vlan", "subnet", id));
        }
        if self.wifi_networks.values().any(|w| w.vlan_id == Some(id)) {
            return Err(StoreError::foreign_key("vlan", "wifi_network", id));
        }
        self.vlans
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("vlan", id))
    }

    pub fn vlans_for_site(&self, site_id: EntityId) -> Vec<Vlan> {
        self.vlans
            .values()
            .filter(|v| v.site_id == site_id)
            .cloned()
            .collect()
    }

    // ── Subnets ──────────────────────────────────────────────────────

    pub fn insert_subnet(&mut self, mut subnet: Subnet) -> Result<Subnet, StoreError> {
        self.require_site("subnet", subnet.site_id)?;
        if let Some(vlan_id) = subnet.vlan_id {
            if !self.vlans.contains_key(&vlan_id) {
                return Err(StoreError::foreign_key("subnet", "vlan", vlan_id));
            }
        }
        subnet.id = EntityId::new();
        self.subnets.insert(subnet.id, subnet.clone());
        Ok(subnet)
    }

    pub fn subnet(&self, id: EntityId) -> Option<&Subnet> {
        self.subnets.get(&id)
    }

    pub fn delete_subnet(&mut self, id: EntityId) -> Result<Subnet, StoreError> {
        if self.ip_addresses.values().any(|a| a.subnet_id == id) {
            return Err(StoreError::foreign_key("subnet", "ip_address", id));
        }
        if self.ip_ranges.values().any(|r| r.subnet_id == id) {
            return Err(StoreError::foreign_key("subnet", "ip_range", id));
        }
        if self.wifi_networks.values().any(|w| w.subnet_id == Some(id)) {
            return Err(StoreError::foreign_key("subnet", "wifi_network", id));
        }
        self.subnets
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("subnet", id))
    }

    /// Subnets of a site in enumeration (insertion) order. This order is
    /// the documented tie-break when overlapping subnets both contain an
    /// address: the earliest-created one wins.
    pub fn subnets_for_site(&self, site_id: EntityId) -> Vec<Subnet> {
        self.subnets
            .values()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect()
    }

    // ── Subnet templates ─────────────────────────────────────────────

    pub fn insert_subnet_template(
        &mut self,
        mut template: SubnetTemplate,
    ) -> Result<SubnetTemplate, StoreError> {
        self.require_site("subnet_template", template.site_id)?;
        template.id = EntityId::new();
        self.subnet_templates.insert(template.id, template.clone());
        Ok(template)
    }

    pub fn delete_subnet_template(&mut self, id: EntityId) -> Result<SubnetTemplate, StoreError> {
        self.subnet_templates
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("subnet_template", id))
    }

    pub fn subnet_templates_for_site(&self, site_id: EntityId) -> Vec<SubnetTemplate> {
        self.subnet_templates
            .values()
            .filter(|t| t.site_id == site_id)
            .cloned()
            .collect()
    }

    // ── IP addresses ─────────────────────────────────────────────────

    pub fn insert_ip_address(&mut self, mut ip: IpAddress) -> Result<IpAddress, StoreError> {
        self.require_site("ip_address", ip.site_id)?;
        if !self.subnets.contains_key(&ip.subnet_id) {
            return Err(StoreError::foreign_key("ip_address", "subnet", ip.subnet_id));
        }
        if self
            .ip_addresses
            .values()
            .any(|a| a.subnet_id == ip.subnet_id && a.address == ip.address)
        {
            return Err(StoreError::Duplicate {
                entity: "ip_address",
                key: ip.address,
            });
        }
        ip.id = EntityId::new();
        self.ip_addresses.insert(ip.id, ip.clone());
        Ok(ip)
    }

    pub fn ip_address(&self, id: EntityId) -> Option<&IpAddress> {
        self.ip_addresses.get(&id)
    }

    pub fn update_ip_address(&mut self, ip: IpAddress) -> Result<(), StoreError> {
        if !self.subnets.contains_key(&ip.subnet_id) {
            return Err(StoreError::foreign_key("ip_address", "subnet", ip.subnet_id));
        }
        match self.ip_addresses.get_mut(&ip.id) {
            Some(slot) => {
                *slot = ip;
                Ok(())
            }
            None => Err(StoreError::missing("ip_address", ip.id)),
        }
    }

    pub fn delete_ip_address(&mut self, id: EntityId) -> Result<IpAddress, StoreError> {
        self.ip_addresses
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("ip_address", id))
    }

    pub fn ip_addresses_for_site(&self, site_id: EntityId) -> Vec<IpAddress> {
        self.ip_addresses
            .values()
            .filter(|a| a.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn ip_addresses_for_subnet(&self, subnet_id: EntityId) -> Vec<IpAddress> {
        self.ip_addresses
            .values()
            .filter(|a| a.subnet_id == subnet_id)
            .cloned()
            .collect()
    }

    /// The at-most-one row matching (address, subnet).
    pub fn ip_address_in_subnet(&self, subnet_id: EntityId, address: &str) -> Option<&IpAddress> {
        self.ip_addresses
            .values()
            .find(|a| a.subnet_id == subnet_id && a.address == address)
    }

    /// The row currently linked to a device by (address, assigned_to).
    pub fn ip_address_assigned(
        &self,
        site_id: EntityId,
        address: &str,
        device_name: &str,
    ) -> Option<&IpAddress> {
        self.ip_addresses.values().find(|a| {
            a.site_id == site_id
                && a.address == address
                && a.assigned_to.as_deref() == Some(device_name)
        })
    }

    // ── IP ranges ────────────────────────────────────────────────────

    pub fn insert_ip_range(&mut self, mut range: IpRange) -> Result<IpRange, StoreError> {
        self.require_site("ip_range", range.site_id)?;
        if !self.subnets.contains_key(&range.subnet_id) {
            return Err(StoreError::foreign_key("ip_range", "subnet", range.subnet_id));
        }
        if let Some(entry_id) = range.scheme_entry_id {
            if !self.scheme_entries.contains_key(&entry_id) {
                return Err(StoreError::foreign_key("ip_range", "scheme_entry", entry_id));
            }
        }
        if let (Ok(start), Ok(end)) = (addr::to_int(&range.start_addr), addr::to_int(&range.end_addr))
        {
            if start > end {
                return Err(StoreError::Integrity {
                    message: format!("range start {} after end {}", range.start_addr, range.end_addr),
                });
            }
        }
        range.id = EntityId::new();
        self.ip_ranges.insert(range.id, range.clone());
        Ok(range)
    }

    pub fn delete_ip_range(&mut self, id: EntityId) -> Result<IpRange, StoreError> {
        self.ip_ranges
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("ip_range", id))
    }

    pub fn ip_ranges_for_site(&self, site_id: EntityId) -> Vec<IpRange> {
        self.ip_ranges
            .values()
            .filter(|r| r.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn ip_ranges_for_subnet(&self, subnet_id: EntityId) -> Vec<IpRange> {
        self.ip_ranges
            .values()
            .filter(|r| r.subnet_id == subnet_id)
            .cloned()
            .collect()
    }

    /// Null out every range -> scheme-entry link under a site. Run before
    /// deleting scheme entries so their FK checks pass.
    pub fn detach_ranges_from_schemes(&mut self, site_id: EntityId) {
        for range in self.ip_ranges.values_mut() {
            if range.site_id == site_id {
                range.scheme_entry_id = None;
            }
        }
    }

    // ── Range schemes ────────────────────────────────────────────────

    pub fn insert_range_scheme(&mut self, mut scheme: RangeScheme) -> Result<RangeScheme, StoreError> {
        self.require_site("range_scheme", scheme.site_id)?;
        scheme.id = EntityId::new();
        self.range_schemes.insert(scheme.id, scheme.clone());
        Ok(scheme)
    }

    pub fn delete_range_scheme(&mut self, id: EntityId) -> Result<RangeScheme, StoreError> {
        if self.scheme_entries.values().any(|e| e.scheme_id == id) {
            return Err(StoreError::foreign_key("range_scheme", "scheme_entry", id));
        }
        self.range_schemes
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("range_scheme", id))
    }

    pub fn range_schemes_for_site(&self, site_id: EntityId) -> Vec<RangeScheme> {
        self.range_schemes
            .values()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn insert_scheme_entry(&mut self, mut entry: SchemeEntry) -> Result<SchemeEntry, StoreError> {
        if !self.range_schemes.contains_key(&entry.scheme_id) {
            return Err(StoreError::foreign_key("scheme_entry", "range_scheme", entry.scheme_id));
        }
        entry.id = EntityId::new();
        self.scheme_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    pub fn delete_scheme_entry(&mut self, id: EntityId) -> Result<SchemeEntry, StoreError> {
        if self.ip_ranges.values().any(|r| r.scheme_entry_id == Some(id)) {
            return Err(StoreError::foreign_key("scheme_entry", "ip_range", id));
        }
        self.scheme_entries
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("scheme_entry", id))
    }

    pub fn scheme_entries_for_scheme(&self, scheme_id: EntityId) -> Vec<SchemeEntry> {
        self.scheme_entries
            .values()
            .filter(|e| e.scheme_id == scheme_id)
            .cloned()
            .collect()
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub fn insert_device(&mut self, mut device: Device) -> Result<Device, StoreError> {
        self.require_site("device", device.site_id)?;
        device.id = EntityId::new();
        self.devices.insert(device.id, device.clone());
        Ok(device)
    }

    pub fn device(&self, id: EntityId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn update_device(&mut self, device: Device) -> Result<(), StoreError> {
        match self.devices.get_mut(&device.id) {
            Some(slot) => {
                *slot = device;
                Ok(())
            }
            None => Err(StoreError::missing("device", device.id)),
        }
    }

    pub fn delete_device(&mut self, id: EntityId) -> Result<Device, StoreError> {
        if self.services.values().any(|s| s.device_id == id) {
            return Err(StoreError::foreign_key("device", "service", id));
        }
        self.devices
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("device", id))
    }

    pub fn devices_for_site(&self, site_id: EntityId) -> Vec<Device> {
        self.devices
            .values()
            .filter(|d| d.site_id == site_id)
            .cloned()
            .collect()
    }

    // ── Services ─────────────────────────────────────────────────────

    pub fn insert_service(&mut self, mut service: Service) -> Result<Service, StoreError> {
        self.require_site("service", service.site_id)?;
        if !self.devices.contains_key(&service.device_id) {
            return Err(StoreError::foreign_key("service", "device", service.device_id));
        }
        service.id = EntityId::new();
        self.services.insert(service.id, service.clone());
        Ok(service)
    }

    pub fn delete_service(&mut self, id: EntityId) -> Result<Service, StoreError> {
        self.services
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("service", id))
    }

    pub fn services_for_site(&self, site_id: EntityId) -> Vec<Service> {
        self.services
            .values()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn services_for_device(&self, device_id: EntityId) -> Vec<Service> {
        self.services
            .values()
            .filter(|s| s.device_id == device_id)
            .cloned()
            .collect()
    }

    // ── WiFi networks ────────────────────────────────────────────────

    pub fn insert_wifi_network(&mut self, mut wifi: WifiNetwork) -> Result<WifiNetwork, StoreError> {
        self.require_site("wifi_network", wifi.site_id)?;
        if let Some(vlan_id) = wifi.vlan_id {
            if !self.vlans.contains_key(&vlan_id) {
                return Err(StoreError::foreign_key("wifi_network", "vlan", vlan_id));
            }
        }
        if let Some(subnet_id) = wifi.subnet_id {
            if !self.subnets.contains_key(&subnet_id) {
                return Err(StoreError::foreign_key("wifi_network", "subnet", subnet_id));
            }
        }
        wifi.id = EntityId::new();
        self.wifi_networks.insert(wifi.id, wifi.clone());
        Ok(wifi)
    }

    pub fn delete_wifi_network(&mut self, id: EntityId) -> Result<WifiNetwork, StoreError> {
        self.wifi_networks
            .shift_remove(&id)
            .ok_or_else(|| StoreError::missing("wifi_network", id))
    }

    pub fn wifi_networks_for_site(&self, site_id: EntityId) -> Vec<WifiNetwork> {
        self.wifi_networks
            .values()
            .filter(|w| w.site_id == site_id)
            .cloned()
            .collect()
    }

    // ── Site settings ────────────────────────────────────────────────

    pub fn insert_site_settings(&mut self, settings: SiteSettings) -> Result<SiteSettings, StoreError> {
        self.require_site("site_settings", settings.site_id)?;
        if self.site_settings.contains_key(&settings.site_id) {
            return Err(StoreError::Duplicate {
                entity: "site_settings",
                key: settings.site_id.to_string(),
            });
        }
        self.site_settings.insert(settings.site_id, settings.clone());
        Ok(settings)
    }

    pub fn delete_site_settings(&mut self, site_id: EntityId) -> Option<SiteSettings> {
        self.site_settings.shift_remove(&site_id)
    }

    pub fn site_settings_for(&self, site_id: EntityId) -> Option<&SiteSettings> {
        self.site_settings.get(&site_id)
    }

    // ── Change log ───────────────────────────────────────────────────

    pub fn insert_change_entry(&mut self, mut entry: ChangeEntry) -> Result<ChangeEntry, StoreError> {
        self.require_site("change_entry", entry.site_id)?;
        entry.id = EntityId::new();
        self.change_log.insert(entry.id, entry.clone());
        Ok(entry)
    }

    /// Append an audit entry stamped with the current time.
    pub fn append_change(
        &mut self,
        site_id: EntityId,
        object_type: &str,
        object_id: &str,
        action: ChangeAction,
        changes: serde_json::Value,
    ) -> Result<ChangeEntry, StoreError> {
        self.insert_change_entry(ChangeEntry {
            id: EntityId::new(),
            site_id,
            object_type: object_type.to_owned(),
            object_id: object_id.to_owned(),
            action,
            changes,
            timestamp: Utc::now(),
        })
    }

    pub fn delete_change_entries_for_site(&mut self, site_id: EntityId) -> usize {
        let before = self.change_log.len();
        self.change_log.retain(|_, e| e.site_id != site_id);
        before - self.change_log.len()
    }

    pub fn change_entries_for_site(&self, site_id: EntityId) -> Vec<ChangeEntry> {
        self.change_log
            .values()
            .filter(|e| e.site_id == site_id)
            .cloned()
            .collect()
    }
}
