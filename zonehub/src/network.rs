//! The controller directory.

use std::net::Ipv4Addr;

use tracing::info;

use zonehub_discovery::{
    DeviceCollection, DeviceProber, DeviceProvider, DeviceRegistry, FileCache, HttpProber,
};
use zonehub_topology::{resolve_topology, GroupId, HttpTopologySource, Topology, TopologySource};

use crate::cached::Cached;
use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::lookup::match_by_name;

/// Directory of the playback groups on the local network.
///
/// Everything is resolved lazily on first use: discovery runs when the device
/// set is first needed, the topology is fetched when a lookup first needs it,
/// and both stay cached until explicitly invalidated.
pub struct Network {
    provider: Box<dyn DeviceProvider>,
    registry: DeviceRegistry,
    source: Box<dyn TopologySource>,
    topology: Cached<Topology>,
}

/// Assembles a [`Network`], with injection points for every external seam.
#[derive(Default)]
pub struct NetworkBuilder {
    provider: Option<Box<dyn DeviceProvider>>,
    prober: Option<Box<dyn DeviceProber>>,
    source: Option<Box<dyn TopologySource>>,
}

impl NetworkBuilder {
    pub fn provider(mut self, provider: Box<dyn DeviceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn prober(mut self, prober: Box<dyn DeviceProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn source(mut self, source: Box<dyn TopologySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<Network> {
        let provider = self.provider.unwrap_or_else(|| {
            Box::new(DeviceCollection::new(Box::new(FileCache::in_temp_dir())))
        });
        let prober: Box<dyn DeviceProber> = match self.prober {
            Some(prober) => prober,
            None => Box::new(HttpProber::new()?),
        };
        let source: Box<dyn TopologySource> = match self.source {
            Some(source) => source,
            None => Box::new(HttpTopologySource::new()?),
        };
        Ok(Network {
            provider,
            registry: DeviceRegistry::new(prober),
            source,
            topology: Cached::Stale,
        })
    }
}

impl Network {
    /// Directory over the real network, with a file-backed address cache.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::default()
    }

    /// The current topology snapshot, resolving it first if stale.
    ///
    /// Runs the full pipeline on a cold start: provider (cache or discovery),
    /// capability probing, then one topology fetch. Discovery that yields no
    /// devices at all is fatal.
    pub fn topology(&mut self) -> Result<&Topology> {
        let provider = &mut self.provider;
        let registry = &mut self.registry;
        let source = self.source.as_ref();
        self.topology.get_or_try_resolve(|| {
            let addresses = provider.addresses()?;
            if addresses.is_empty() {
                return Err(Error::NoDevicesFound);
            }
            info!(count = addresses.len(), "resolving topology for discovered devices");
            let records = registry.resolve(&addresses);
            Ok(resolve_topology(records, source)?)
        })
    }

    /// One controller per playback group.
    pub fn controllers(&mut self) -> Result<Vec<Controller>> {
        Ok(self
            .topology()?
            .groups()
            .iter()
            .map(Controller::for_group)
            .collect())
    }

    /// Any controller, when the caller does not care which group.
    pub fn controller(&mut self) -> Result<Option<Controller>> {
        Ok(self.controllers()?.into_iter().next())
    }

    /// The controller of the group containing the named room.
    ///
    /// An exact room-name match wins over a case-insensitive one.
    pub fn controller_by_room(&mut self, room: &str) -> Result<Option<Controller>> {
        let topology = self.topology()?;
        let entries: Vec<_> = topology.entries().collect();
        let Some(entry) = match_by_name(&entries, room, |e| e.room.as_str()) else {
            return Ok(None);
        };
        Ok(topology.group_of(entry.address).map(Controller::for_group))
    }

    /// The controller of the group containing the device at `address`.
    ///
    /// Unlike room lookup this is exact: asking for an address the directory
    /// does not know is a caller error.
    pub fn controller_by_ip(&mut self, address: Ipv4Addr) -> Result<Controller> {
        let topology = self.topology()?;
        let group = topology
            .group_of(address)
            .ok_or(Error::UnknownAddress(address))?;
        Ok(Controller::for_group(group))
    }

    /// The controller of the group with the given identity.
    pub fn controller_for_group(&mut self, id: &GroupId) -> Result<Option<Controller>> {
        Ok(self.topology()?.group(id).map(Controller::for_group))
    }

    /// Invalidate the topology snapshot.
    ///
    /// The device set is kept; the next lookup re-fetches the topology from
    /// the already known devices. Call this after regrouping devices.
    pub fn clear_topology(&mut self) {
        self.topology.invalidate();
    }

    /// Forget devices and topology both. The next lookup reloads the device
    /// set from the address cache or, on a cache miss, the network.
    pub fn rediscover(&mut self) {
        self.provider.clear();
        self.topology.invalidate();
    }
}
