//! Seam for sending control actions to a device.
//!
//! The directory resolves which coordinator should receive an action. The
//! transport that carries it is supplied by the caller through this trait.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Failure modes of an action transport.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The device could not be reached or the exchange broke off.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The device answered with a fault code.
    #[error("device returned fault code {0}")]
    Fault(u16),
}

/// Sends a named action to a device and returns its response values.
pub trait ActionInvoker {
    fn invoke(
        &self,
        address: Ipv4Addr,
        service: &str,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<HashMap<String, String>, InvokeError>;
}
