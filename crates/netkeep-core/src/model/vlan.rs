// ── VLAN domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use super::subnet::NetworkRole;

/// VLAN lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VlanStatus {
    Active,
    Planned,
    Deprecated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vlan {
    pub id: EntityId,
    pub site_id: EntityId,
    /// 802.1Q VLAN id, 1-4094. Unique within a site.
    pub vid: u16,
    pub name: String,
    pub role: NetworkRole,
    pub status: VlanStatus,
}
