//! Builds a validated [`Topology`] from one device's view of the network.
//!
//! Any playback-capable device can report the whole network's group
//! structure, so resolution asks exactly one of them and validates the
//! answer against the set of devices discovery found.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::{debug, info, warn};

use zonehub_discovery::{host_of, DeviceRecord};

use crate::error::{Result, TopologyError};
use crate::parser::{parse_topology, RawZonePlayer};
use crate::types::{Group, GroupId, Topology, TopologyEntry};

/// Where topology documents come from. Tests substitute canned XML.
pub trait TopologySource {
    fn fetch(&self, address: Ipv4Addr) -> Result<String>;
}

/// Fetches the topology document over HTTP from a device's status endpoint.
#[derive(Debug, Clone)]
pub struct HttpTopologySource {
    client: reqwest::blocking::Client,
}

impl HttpTopologySource {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TopologyError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl TopologySource for HttpTopologySource {
    fn fetch(&self, address: Ipv4Addr) -> Result<String> {
        let url = format!("http://{address}:1400/status/topology");
        self.client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| TopologyError::SourceUnreachable {
                address,
                message: e.to_string(),
            })
    }
}

/// Resolve the current topology for the given devices.
///
/// The first playback-capable record is used as the source; a fetch failure
/// there is fatal. Individual records inside the document that lack the
/// fields needed to build an entry are skipped. After grouping, two
/// invariants are enforced: every group has exactly one coordinator, and
/// every playback-capable device appears in the document.
pub fn resolve_topology(
    devices: &[DeviceRecord],
    source: &dyn TopologySource,
) -> Result<Topology> {
    let source_address = devices
        .iter()
        .find(|d| d.is_playback_capable())
        .map(|d| d.address)
        .ok_or(TopologyError::NoSourceDevice)?;

    info!(%source_address, "fetching topology");
    let xml = source.fetch(source_address)?;
    let players = parse_topology(&xml)?;

    let entries: Vec<TopologyEntry> = players.into_iter().filter_map(entry_of).collect();
    debug!(count = entries.len(), "topology entries parsed");

    for device in devices.iter().filter(|d| d.is_playback_capable()) {
        if !entries.iter().any(|e| e.address == device.address) {
            return Err(TopologyError::DeviceMissing(device.address));
        }
    }

    let groups = group_entries(entries)?;
    Ok(Topology::new(groups))
}

/// Build an entry from a raw record, or drop it when a required field is
/// missing. A device that is not in any group reports itself as a group of
/// one under its own uuid.
fn entry_of(player: RawZonePlayer) -> Option<TopologyEntry> {
    let coordinator = player.is_coordinator();
    let RawZonePlayer {
        group,
        location,
        uuid,
        room,
        ..
    } = player;

    let (Some(uuid), Some(room)) = (uuid, room) else {
        warn!("skipping topology record without uuid or room name");
        return None;
    };
    let Some(address) = location.as_deref().and_then(host_of) else {
        warn!(%uuid, "skipping topology record without a usable location");
        return None;
    };

    let (group, coordinator) = match group.filter(|g| !g.is_empty()) {
        Some(group) => (GroupId::new(group), coordinator),
        // Ungrouped devices coordinate a group of one under their own uuid.
        None => (GroupId::new(uuid.clone()), true),
    };

    Some(TopologyEntry {
        address,
        group,
        coordinator,
        room,
        uuid,
    })
}

fn group_entries(entries: Vec<TopologyEntry>) -> Result<Vec<Group>> {
    // First-seen order of group ids is preserved.
    let mut order: Vec<GroupId> = Vec::new();
    let mut members: HashMap<GroupId, Vec<TopologyEntry>> = HashMap::new();

    for entry in entries {
        let bucket = members.entry(entry.group.clone()).or_insert_with(|| {
            order.push(entry.group.clone());
            Vec::new()
        });
        bucket.push(entry);
    }

    let mut groups = Vec::with_capacity(order.len());
    for id in order {
        let Some(bucket) = members.remove(&id) else {
            continue;
        };
        let count = bucket.iter().filter(|e| e.coordinator).count();
        if count != 1 {
            return Err(TopologyError::CoordinatorCount {
                group: id.to_string(),
                count,
            });
        }

        let (mut coordinators, followers): (Vec<_>, Vec<_>) =
            bucket.into_iter().partition(|e| e.coordinator);
        let Some(coordinator) = coordinators.pop() else {
            continue;
        };
        groups.push(Group::new(id, coordinator, followers));
    }

    Ok(groups)
}
