//! Device discovery for UPnP playback systems.
//!
//! This crate finds playback devices on the local network with an SSDP
//! multicast probe, remembers their addresses across runs in a pluggable
//! [`AddressCache`], and classifies each device by probing its UPnP
//! description over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use zonehub_discovery::{DeviceCollection, DeviceProvider, FileCache};
//!
//! fn main() -> zonehub_discovery::Result<()> {
//!     let mut collection = DeviceCollection::new(Box::new(FileCache::in_temp_dir()));
//!     for address in collection.addresses()? {
//!         println!("device at {address}");
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod collection;
mod device;
mod error;
mod ssdp;

pub use cache::{AddressCache, FileCache, MemoryCache, ADDRESS_CACHE_KEY};
pub use collection::{DeviceCollection, DeviceProvider, DiscoveryConfig};
pub use device::{
    Capability, DeviceDescription, DeviceProber, DeviceRecord, DeviceRegistry, HttpProber,
};
pub use error::{DiscoveryError, Result};
pub use ssdp::{
    build_msearch, host_of, parse_response_blocks, FakeSocket, MulticastSocket, SsdpSocket,
    DEFAULT_MULTICAST_ADDR, SEARCH_TARGET,
};
