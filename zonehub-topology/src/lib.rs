//! Group topology resolution for ZonePlayer networks.
//!
//! Devices report how the whole network is grouped through a single status
//! document. This crate fetches that document from one playback-capable
//! device, parses it, and validates it into an immutable [`Topology`]
//! snapshot: groups of rooms, each with exactly one coordinator.
//!
//! # Example
//!
//! ```no_run
//! use zonehub_topology::{resolve_topology, HttpTopologySource};
//!
//! # fn run(devices: &[zonehub_discovery::DeviceRecord]) -> zonehub_topology::Result<()> {
//! let source = HttpTopologySource::new()?;
//! let topology = resolve_topology(devices, &source)?;
//! for group in topology.groups() {
//!     println!("{} leads {} rooms", group.coordinator().room, group.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod parser;
mod resolver;
mod types;

pub use error::{Result, TopologyError};
pub use parser::{parse_topology, RawZonePlayer};
pub use resolver::{resolve_topology, HttpTopologySource, TopologySource};
pub use types::{Group, GroupId, Topology, TopologyEntry};
