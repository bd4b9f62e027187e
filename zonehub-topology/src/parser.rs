//! Parser for the `/status/topology` XML document.
//!
//! The document is a flat list of `ZonePlayer` elements whose attributes
//! carry group membership and coordinator status, and whose text content is
//! the room name:
//!
//! ```xml
//! <ZPSupportInfo>
//!   <ZonePlayers>
//!     <ZonePlayer group='RINCON_A:12' coordinator='true'
//!                 location='http://10.0.0.5:1400/xml/device_description.xml'
//!                 uuid='RINCON_A'>Kitchen</ZonePlayer>
//!   </ZonePlayers>
//! </ZPSupportInfo>
//! ```

use serde::Deserialize;

use crate::error::{Result, TopologyError};

#[derive(Debug, Deserialize)]
struct ZpSupportInfo {
    #[serde(rename = "ZonePlayers")]
    zone_players: Option<ZonePlayers>,
}

#[derive(Debug, Deserialize)]
struct ZonePlayers {
    #[serde(rename = "ZonePlayer", default)]
    players: Vec<RawZonePlayer>,
}

/// One `ZonePlayer` element, attributes as reported.
///
/// Everything except `uuid` is optional at this level; validation of what a
/// usable record needs happens during resolution, where incomplete records
/// can be skipped individually.
#[derive(Debug, Clone, Deserialize)]
pub struct RawZonePlayer {
    #[serde(rename = "@group")]
    pub group: Option<String>,
    #[serde(rename = "@coordinator")]
    pub coordinator: Option<String>,
    #[serde(rename = "@location")]
    pub location: Option<String>,
    #[serde(rename = "@uuid")]
    pub uuid: Option<String>,
    #[serde(rename = "$text")]
    pub room: Option<String>,
}

impl RawZonePlayer {
    pub fn is_coordinator(&self) -> bool {
        self.coordinator.as_deref() == Some("true")
    }
}

/// Parse a topology document into its raw zone player records.
///
/// A well-formed document with no `ZonePlayers` element yields an empty list
/// rather than an error.
pub fn parse_topology(xml: &str) -> Result<Vec<RawZonePlayer>> {
    let info: ZpSupportInfo =
        quick_xml::de::from_str(xml).map_err(|e| TopologyError::Parse(e.to_string()))?;
    Ok(info.zone_players.map(|z| z.players).unwrap_or_default())
}
