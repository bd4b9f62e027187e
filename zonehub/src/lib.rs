//! Controller directory for ZonePlayer networks.
//!
//! Ties the lower layers together: [`zonehub_discovery`] finds devices,
//! [`zonehub_topology`] resolves how they are grouped, and this crate answers
//! "who do I talk to" questions (by room name, by address, or by group) with
//! [`Controller`] handles pointing at group coordinators.
//!
//! # Example
//!
//! ```no_run
//! use zonehub::Network;
//!
//! fn main() -> zonehub::Result<()> {
//!     let mut network = Network::new()?;
//!     if let Some(controller) = network.controller_by_room("Kitchen")? {
//!         println!("Kitchen is controlled from {}", controller.address);
//!     }
//!     Ok(())
//! }
//! ```

mod cached;
mod controller;
mod error;
mod invoker;
mod lookup;
mod network;

pub use cached::Cached;
pub use controller::Controller;
pub use error::{Error, Result};
pub use invoker::{ActionInvoker, InvokeError};
pub use lookup::match_by_name;
pub use network::{Network, NetworkBuilder};

pub use zonehub_discovery as discovery;
pub use zonehub_topology as topology;
