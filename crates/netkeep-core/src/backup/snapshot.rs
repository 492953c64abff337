// ── Snapshot document schema ──
//
// The wire format for site backups. Every entity group that other groups
// reference carries an `_exportId`; children embed the export id of
// their parent instead of a store-native foreign key, so a snapshot
// stays meaningful long after the original store identifiers are gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{
    ChangeAction, DeviceState, IpStatus, NetworkRole, Protocol, ServiceHealth, VlanStatus,
    WifiBand, WifiSecurity,
};

/// Current document version. Written on export; import requires the
/// field to be present but treats the value as informational.
pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub site: SiteRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_settings: Option<SettingsRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vlans: Vec<VlanRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<IpAddressRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_ranges: Vec<IpRangeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_templates: Vec<SubnetTemplateRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range_schemes: Vec<RangeSchemeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wifi_networks: Vec<WifiNetworkRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_logs: Vec<ChangeLogRecord>,
}

impl Snapshot {
    /// Validate and parse an incoming document.
    ///
    /// The `version` and `site` fields are checked up front so their
    /// absence yields a clean `InvalidSnapshot` instead of a generic
    /// deserialization message.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        let Some(doc) = value.as_object() else {
            return Err(CoreError::invalid_snapshot("not a JSON object"));
        };
        if !doc.get("version").is_some_and(serde_json::Value::is_string) {
            return Err(CoreError::invalid_snapshot("missing version field"));
        }
        if !doc.contains_key("site") {
            return Err(CoreError::invalid_snapshot("missing site field"));
        }
        serde_json::from_value(value)
            .map_err(|err| CoreError::invalid_snapshot(format!("malformed document: {err}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub default_subnet_mask: u8,
    pub changelog_retention: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanRecord {
    #[serde(rename = "_exportId")]
    pub export_id: String,
    pub vid: u16,
    pub name: String,
    pub role: NetworkRole,
    pub status: VlanStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetRecord {
    #[serde(rename = "_exportId")]
    pub export_id: String,
    #[serde(rename = "_vlanExportId", default, skip_serializing_if = "Option::is_none")]
    pub vlan_export_id: Option<String>,
    pub prefix: String,
    pub mask: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    pub role: NetworkRole,
    pub status: VlanStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    #[serde(rename = "_exportId")]
    pub export_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: DeviceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddressRecord {
    #[serde(rename = "_subnetExportId", default, skip_serializing_if = "Option::is_none")]
    pub subnet_export_id: Option<String>,
    pub address: String,
    pub mask: u8,
    pub status: IpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpRangeRecord {
    #[serde(rename = "_subnetExportId", default, skip_serializing_if = "Option::is_none")]
    pub subnet_export_id: Option<String>,
    #[serde(
        rename = "_schemeEntryExportId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scheme_entry_export_id: Option<String>,
    pub start_addr: String,
    pub end_addr: String,
    pub role: NetworkRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetTemplateRecord {
    pub name: String,
    pub mask: u8,
    pub role: NetworkRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSchemeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<SchemeEntryRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeEntryRecord {
    #[serde(rename = "_exportId")]
    pub export_id: String,
    pub name: String,
    pub offset_start: u32,
    pub offset_end: u32,
    pub role: NetworkRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    #[serde(rename = "_deviceExportId", default, skip_serializing_if = "Option::is_none")]
    pub device_export_id: Option<String>,
    pub name: String,
    pub protocol: Protocol,
    #[serde(default)]
    pub ports: Vec<u16>,
    pub health: ServiceHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiNetworkRecord {
    #[serde(rename = "_vlanExportId", default, skip_serializing_if = "Option::is_none")]
    pub vlan_export_id: Option<String>,
    #[serde(rename = "_subnetExportId", default, skip_serializing_if = "Option::is_none")]
    pub subnet_export_id: Option<String>,
    pub ssid: String,
    pub security: WifiSecurity,
    pub band: WifiBand,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogRecord {
    pub object_type: String,
    pub object_id: String,
    pub action: ChangeAction,
    pub changes: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_missing_version() {
        let err = Snapshot::from_value(json!({"site": {"name": "A", "slug": "a"}})).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn rejects_missing_site() {
        let err = Snapshot::from_value(json!({"version": "1.0"})).unwrap_err();
        assert!(err.to_string().contains("site"));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(Snapshot::from_value(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn accepts_minimal_document() {
        let snap = Snapshot::from_value(json!({
            "version": "1.0",
            "exportedAt": "2026-01-15T10:00:00Z",
            "site": {"name": "Home", "slug": "home"},
        }))
        .unwrap();
        assert_eq!(snap.site.slug, "home");
        assert!(snap.vlans.is_empty());
    }

    #[test]
    fn parses_export_reference_fields() {
        let snap = Snapshot::from_value(json!({
            "version": "1.0",
            "exportedAt": "2026-01-15T10:00:00Z",
            "site": {"name": "Home", "slug": "home"},
            "vlans": [{"_exportId": "v1", "vid": 10, "name": "users",
                       "role": "lan", "status": "active"}],
            "subnets": [{"_exportId": "s1", "_vlanExportId": "v1",
                         "prefix": "10.0.10.0", "mask": 24,
                         "role": "lan", "status": "active"}],
        }))
        .unwrap();
        assert_eq!(snap.vlans[0].export_id, "v1");
        assert_eq!(snap.subnets[0].vlan_export_id.as_deref(), Some("v1"));
    }
}
