// ── Change log domain types ──
//
// Append-only audit trail. Entries reference objects by plain string id
// and are never rewritten -- after a backup import the referenced ids may
// no longer exist, which is intentional (historical record, not a join).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    Imported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub id: EntityId,
    pub site_id: EntityId,
    /// Entity kind, e.g. "device" or "subnet".
    pub object_type: String,
    /// String form of the object's id at the time of the change.
    pub object_id: String,
    pub action: ChangeAction,
    /// Serialized description of what changed.
    pub changes: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
