// ── Site domain types ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// The tenant boundary. Every other entity belongs to exactly one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: EntityId,
    /// Human-friendly display name.
    pub name: String,
    /// URL-safe identifier, unique across all sites.
    pub slug: String,
    pub description: Option<String>,
}

/// Per-site settings. A single row per site, created lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettings {
    pub site_id: EntityId,
    /// Mask suggested when creating subnets from the UI.
    pub default_subnet_mask: u8,
    /// How many change-log entries to retain before pruning.
    pub changelog_retention: u32,
    pub notes: Option<String>,
}

impl SiteSettings {
    pub fn defaults_for(site_id: EntityId) -> Self {
        Self {
            site_id,
            default_subnet_mask: 24,
            changelog_retention: 500,
            notes: None,
        }
    }
}

/// Device category (e.g. "server", "printer", "camera").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub site_id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}
