// ── API request/response types ──
//
// Wire shapes for the HTTP surface. Requests use Option fields where a
// value is optional or defaultable; responses embed core model types
// directly where they already serialize cleanly.

use serde::{Deserialize, Serialize};

use netkeep_core::model::{DeviceState, IpStatus, NetworkRole, VlanStatus};
use netkeep_core::ImportCounts;

// ── Errors ──────────────────────────────────────────────────────────

/// Uniform error body: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

// ── Devices ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequest {
    pub name: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    /// Free-text address; empty or absent means "no address".
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<DeviceState>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<DeviceState>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ── VLANs / subnets ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVlanRequest {
    pub vid: u16,
    pub name: String,
    #[serde(default)]
    pub role: Option<NetworkRole>,
    #[serde(default)]
    pub status: Option<VlanStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetRequest {
    pub prefix: String,
    pub mask: u8,
    #[serde(default)]
    pub vlan_id: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub role: Option<NetworkRole>,
    #[serde(default)]
    pub status: Option<VlanStatus>,
}

/// Subnet plus its derived utilization, as listed by `GET /api/subnets`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetResponse {
    pub id: String,
    pub cidr: String,
    pub prefix: String,
    pub mask: u8,
    pub vlan_id: Option<String>,
    pub gateway: Option<String>,
    pub role: NetworkRole,
    pub status: VlanStatus,
    pub total_ips: u32,
    pub used_ips: u32,
    pub utilization: u32,
}

// ── IP addresses ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIpAddressRequest {
    pub subnet_id: String,
    pub address: String,
    #[serde(default)]
    pub status: Option<IpStatus>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub dns_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Dashboard ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub devices: usize,
    pub subnets: usize,
    pub vlans: usize,
    pub wifi_networks: usize,
    pub services: usize,
    pub ip_addresses: usize,
    pub subnet_utilization: Vec<SubnetUtilizationRow>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetUtilizationRow {
    pub id: String,
    pub cidr: String,
    pub total_ips: u32,
    pub used_ips: u32,
    pub utilization: u32,
}

// ── Backup ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub counts: ImportCounts,
}

/// Body of delete endpoints: `{"success": true}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
