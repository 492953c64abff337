// ── WiFi network domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum WifiSecurity {
    Open,
    Wpa2,
    Wpa3,
    #[serde(rename = "wpa2-wpa3")]
    #[strum(serialize = "wpa2-wpa3")]
    Wpa2Wpa3,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum WifiBand {
    #[serde(rename = "2.4ghz")]
    #[strum(serialize = "2.4ghz")]
    Band2_4,
    #[serde(rename = "5ghz")]
    #[strum(serialize = "5ghz")]
    Band5,
    #[serde(rename = "6ghz")]
    #[strum(serialize = "6ghz")]
    Band6,
    #[serde(rename = "dual")]
    #[strum(serialize = "dual")]
    Dual,
}

/// A broadcast SSID. VLAN and subnet links are optional -- a WiFi network
/// is valid without either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub id: EntityId,
    pub site_id: EntityId,
    pub ssid: String,
    pub security: WifiSecurity,
    pub band: WifiBand,
    pub vlan_id: Option<EntityId>,
    pub subnet_id: Option<EntityId>,
    pub hidden: bool,
    pub enabled: bool,
}
