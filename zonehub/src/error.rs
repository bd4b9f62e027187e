//! Error types for the facade crate.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Error type for directory operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Discovery completed but found nothing. A directory over zero devices
    /// would silently answer every lookup with "not found", so this is fatal
    /// instead.
    #[error("no devices found on the network")]
    NoDevicesFound,

    /// An address lookup named a device that is not in the topology.
    #[error("no device with address {0} is known")]
    UnknownAddress(Ipv4Addr),

    #[error(transparent)]
    Discovery(#[from] zonehub_discovery::DiscoveryError),

    #[error(transparent)]
    Topology(#[from] zonehub_topology::TopologyError),
}

/// Convenience Result alias for directory operations.
pub type Result<T> = std::result::Result<T, Error>;
