// ── IP inventory domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use super::subnet::NetworkRole;

/// Lifecycle status of an IPAM address record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IpStatus {
    Active,
    Reserved,
    Dhcp,
    Deprecated,
}

/// An authoritative IPAM address record.
///
/// `address` falls inside the owning subnet's CIDR; there is at most one
/// row per (address, subnet). `assigned_to` holds the name of the device
/// the address is linked to, maintained by the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: EntityId,
    pub site_id: EntityId,
    pub subnet_id: EntityId,
    pub address: String,
    pub mask: u8,
    pub status: IpStatus,
    pub assigned_to: Option<String>,
    pub dns_name: Option<String>,
    pub description: Option<String>,
}

/// A contiguous address range inside a subnet (e.g. a DHCP pool).
///
/// `start_addr <= end_addr` numerically; enforced on insert. The optional
/// scheme-entry link records which reusable template stamped the range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpRange {
    pub id: EntityId,
    pub site_id: EntityId,
    pub subnet_id: EntityId,
    pub start_addr: String,
    pub end_addr: String,
    pub role: NetworkRole,
    pub scheme_entry_id: Option<EntityId>,
}
