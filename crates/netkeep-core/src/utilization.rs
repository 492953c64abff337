// ── Subnet utilization ──
//
// Read-only derivation for dashboards. Unparseable address strings are
// skipped rather than propagated: one bad record must not take the
// reporting endpoint down.

use std::collections::HashSet;

use serde::Serialize;

use crate::addr;
use crate::model::{Device, IpAddress, Subnet};

/// Per-subnet used/total counts.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetUtilization {
    pub total_ips: u32,
    pub used_ips: u32,
    /// Rounded percentage; 0 when the subnet has no usable capacity.
    pub pct: u32,
}

/// Compute utilization from the subnet's explicit address records plus
/// devices whose free-text address falls inside the subnet.
///
/// The two sources are combined as a set union: a device whose address is
/// already an explicit record counts once.
pub fn utilization_for(
    subnet: &Subnet,
    explicit_addresses: &[IpAddress],
    devices: &[Device],
) -> SubnetUtilization {
    let total_ips = addr::capacity(subnet.mask);

    let mut used: HashSet<u32> = HashSet::new();
    for record in explicit_addresses {
        if let Ok(ip) = addr::to_int(&record.address) {
            used.insert(ip);
        }
    }

    let base = addr::to_int(&subnet.prefix).ok();
    if let Some(base) = base {
        let mask = addr::mask_bits(subnet.mask);
        for device in devices {
            if device.ip_address.is_empty() {
                continue;
            }
            if let Ok(ip) = addr::to_int(&device.ip_address) {
                if (ip & mask) == (base & mask) {
                    used.insert(ip);
                }
            }
        }
    }

    let used_ips = u32::try_from(used.len()).unwrap_or(u32::MAX);
    let pct = if total_ips > 0 {
        let scaled = u64::from(used_ips) * 100 + u64::from(total_ips) / 2;
        u32::try_from(scaled / u64::from(total_ips)).unwrap_or(u32::MAX)
    } else {
        0
    };

    SubnetUtilization {
        total_ips,
        used_ips,
        pct,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceState, EntityId, IpStatus, NetworkRole, VlanStatus};

    fn subnet() -> Subnet {
        Subnet {
            id: EntityId::new(),
            site_id: EntityId::new(),
            vlan_id: None,
            prefix: "10.0.10.0".into(),
            mask: 24,
            gateway: None,
            role: NetworkRole::Lan,
            status: VlanStatus::Active,
        }
    }

    fn record(subnet: &Subnet, address: &str) -> IpAddress {
        IpAddress {
            id: EntityId::new(),
            site_id: subnet.site_id,
            subnet_id: subnet.id,
            address: address.into(),
            mask: subnet.mask,
            status: IpStatus::Active,
            assigned_to: None,
            dns_name: None,
            description: None,
        }
    }

    fn device(site_id: EntityId, ip: &str) -> Device {
        Device {
            id: EntityId::new(),
            site_id,
            name: "dev".into(),
            mac: None,
            ip_address: ip.into(),
            category: None,
            status: DeviceState::Active,
            location: None,
            notes: None,
        }
    }

    #[test]
    fn counts_records_and_devices() {
        let sub = subnet();
        let records = vec![record(&sub, "10.0.10.1"), record(&sub, "10.0.10.2")];
        let devices = vec![device(sub.site_id, "10.0.10.3")];

        let util = utilization_for(&sub, &records, &devices);
        assert_eq!(util.total_ips, 254);
        assert_eq!(util.used_ips, 3);
        assert_eq!(util.pct, 1);
    }

    #[test]
    fn device_matching_explicit_record_counts_once() {
        let sub = subnet();
        let records = vec![record(&sub, "10.0.10.5")];
        let devices = vec![device(sub.site_id, "10.0.10.5")];

        let util = utilization_for(&sub, &records, &devices);
        assert_eq!(util.used_ips, 1);
    }

    #[test]
    fn devices_outside_subnet_are_ignored() {
        let sub = subnet();
        let devices = vec![device(sub.site_id, "192.168.1.1")];

        let util = utilization_for(&sub, &[], &devices);
        assert_eq!(util.used_ips, 0);
    }

    #[test]
    fn bad_address_strings_are_skipped_not_fatal() {
        let sub = subnet();
        let records = vec![record(&sub, "not-an-ip"), record(&sub, "10.0.10.9")];
        let devices = vec![device(sub.site_id, "10.0.10.300")];

        let util = utilization_for(&sub, &records, &devices);
        assert_eq!(util.used_ips, 1);
    }

    #[test]
    fn zero_capacity_reports_zero_pct() {
        let mut sub = subnet();
        sub.mask = 32;
        let util = utilization_for(&sub, &[record(&sub, "10.0.10.0")], &[]);
        assert_eq!(util.total_ips, 0);
        assert_eq!(util.pct, 0);
        assert_eq!(util.used_ips, 1, "explicit records still counted");
    }

    #[test]
    fn pct_rounds_to_nearest() {
        let mut sub = subnet();
        sub.mask = 30; // capacity 2
        let records = vec![record(&sub, "10.0.10.1")];
        let util = utilization_for(&sub, &records, &[]);
        assert_eq!(util.pct, 50);
    }
}
