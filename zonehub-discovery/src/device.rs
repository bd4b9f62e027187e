//! Device records and capability probing.
//!
//! Discovery yields bare addresses; the registry turns them into
//! [`DeviceRecord`]s by fetching each device's UPnP description and checking
//! whether the unit can actually play audio. Administrative-only units
//! (network bridges) answer the same SSDP probe but accept no playback
//! commands, so they must be filtered before topology resolution.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{DiscoveryError, Result};

/// Model numbers of administrative-only units (BOOST / BRIDGE).
const ADMINISTRATIVE_MODELS: [&str; 2] = ["ZB100", "BR100"];

/// UPnP device description root element.
#[derive(Debug, Deserialize)]
pub struct Root {
    pub device: DeviceDescription,
}

/// Device description parsed from `/xml/device_description.xml`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub model_name: String,
    pub model_number: Option<String>,
    pub room_name: Option<String>,
    #[serde(rename = "UDN")]
    pub udn: String,
}

impl DeviceDescription {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::Parse(format!("device description: {e}")))?;
        Ok(root.device)
    }

    /// Whether this unit is a playback-capable node rather than a purely
    /// administrative one.
    pub fn is_playback_capable(&self) -> bool {
        if !self.device_type.contains("ZonePlayer") {
            return false;
        }
        if let Some(model) = &self.model_number {
            if ADMINISTRATIVE_MODELS.contains(&model.as_str()) {
                return false;
            }
        }
        let name = self.model_name.to_lowercase();
        !(name.contains("boost") || name.contains("bridge"))
    }
}

/// What a probed device turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// A playback-capable node.
    Playback,
    /// An administrative-only unit, excluded from playback listings.
    Administrative,
    /// The probe failed; the device is excluded but resolution continues.
    Unreachable,
}

/// One discovered device. Immutable after creation.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    pub address: Ipv4Addr,
    pub capability: Capability,
    pub discovered_at: SystemTime,
    pub model_name: Option<String>,
}

impl DeviceRecord {
    pub fn is_playback_capable(&self) -> bool {
        self.capability == Capability::Playback
    }
}

/// Per-device status check used to classify a discovered address.
pub trait DeviceProber {
    fn describe(&self, address: Ipv4Addr) -> Result<DeviceDescription>;
}

/// Probes devices over HTTP against the fixed description path.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::blocking::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(3))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl DeviceProber for HttpProber {
    fn describe(&self, address: Ipv4Addr) -> Result<DeviceDescription> {
        let url = format!("http://{address}:1400/xml/device_description.xml");
        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;
        let xml = response
            .text()
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;
        DeviceDescription::from_xml(&xml)
    }
}

/// Turns a set of addresses into live device records.
///
/// Owns the records for the lifetime of one discovery cycle. An unreachable
/// address yields a record marked [`Capability::Unreachable`] rather than an
/// error, since any single device may simply be powered off.
pub struct DeviceRegistry {
    prober: Box<dyn DeviceProber>,
    records: Vec<DeviceRecord>,
}

impl DeviceRegistry {
    pub fn new(prober: Box<dyn DeviceProber>) -> Self {
        Self {
            prober,
            records: Vec::new(),
        }
    }

    /// Probe every address and replace the held records.
    pub fn resolve(&mut self, addresses: &BTreeSet<Ipv4Addr>) -> &[DeviceRecord] {
        let now = SystemTime::now();
        self.records = addresses
            .iter()
            .map(|&address| match self.prober.describe(address) {
                Ok(description) => {
                    let capability = if description.is_playback_capable() {
                        Capability::Playback
                    } else {
                        Capability::Administrative
                    };
                    debug!(%address, model = %description.model_name, ?capability, "resolved device");
                    DeviceRecord {
                        address,
                        capability,
                        discovered_at: now,
                        model_name: Some(description.model_name),
                    }
                }
                Err(e) => {
                    warn!(%address, error = %e, "device unreachable during capability probe");
                    DeviceRecord {
                        address,
                        capability: Capability::Unreachable,
                        discovered_at: now,
                        model_name: None,
                    }
                }
            })
            .collect();
        &self.records
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Records eligible to take playback commands.
    pub fn playback_capable(&self) -> Vec<&DeviceRecord> {
        self.records
            .iter()
            .filter(|r| r.is_playback_capable())
            .collect()
    }
}
