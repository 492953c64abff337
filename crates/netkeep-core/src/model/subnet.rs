// ── Subnet domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use super::vlan::VlanStatus;

/// What a network segment is for. Shared by VLANs and subnets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NetworkRole {
    Lan,
    Guest,
    Management,
    Dmz,
    Iot,
    Storage,
    Other,
}

/// An IPv4 subnet. `prefix` is the dotted-quad network base; `mask` is the
/// prefix length defining the membership test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    pub id: EntityId,
    pub site_id: EntityId,
    pub vlan_id: Option<EntityId>,
    pub prefix: String,
    pub mask: u8,
    pub gateway: Option<String>,
    pub role: NetworkRole,
    pub status: VlanStatus,
}

impl Subnet {
    /// CIDR rendering, e.g. "10.0.10.0/24".
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.prefix, self.mask)
    }
}

/// Reusable subnet sizing preset ("branch office /26", "point-to-point /30").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetTemplate {
    pub id: EntityId,
    pub site_id: EntityId,
    pub name: String,
    pub mask: u8,
    pub role: NetworkRole,
    pub description: Option<String>,
}
