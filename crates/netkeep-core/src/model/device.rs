// ── Device and service domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::{EntityId, MacAddress};

/// Device lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceState {
    Active,
    Inactive,
    Maintenance,
    Retired,
}

/// An inventory device (host, switch, printer, camera, ...).
///
/// `ip_address` is free text and denormalized; when non-empty it is kept
/// consistent with the matching `IpAddress` record by the reconciliation
/// engine, with the empty string meaning "no address".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    pub site_id: EntityId,
    pub name: String,
    pub mac: Option<MacAddress>,
    pub ip_address: String,
    /// Category name; free association, not a foreign key.
    pub category: Option<String>,
    pub status: DeviceState,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Transport protocol of a service endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Both,
}

/// Last-observed health of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceHealth {
    Up,
    Down,
    Unknown,
}

/// A network service exposed by a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: EntityId,
    pub site_id: EntityId,
    pub device_id: EntityId,
    pub name: String,
    pub protocol: Protocol,
    pub ports: Vec<u16>,
    pub health: ServiceHealth,
    pub check_url: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}
