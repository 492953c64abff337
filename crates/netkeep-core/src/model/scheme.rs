// ── Range scheme domain types ──
//
// A range scheme is a named set of reusable sub-range templates that can
// be stamped onto subnets ("first 10 addresses static, .100-.200 DHCP").

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::subnet::NetworkRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeScheme {
    pub id: EntityId,
    pub site_id: EntityId,
    pub name: String,
    pub description: Option<String>,
}

/// One template row within a scheme. Offsets are relative to the subnet
/// base address the scheme is applied to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeEntry {
    pub id: EntityId,
    pub scheme_id: EntityId,
    pub name: String,
    pub offset_start: u32,
    pub offset_end: u32,
    pub role: NetworkRole,
}
