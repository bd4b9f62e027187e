//! Error types for the discovery crate.

use thiserror::Error;

/// Error type for discovery operations.
///
/// Parsing problems inside individual SSDP response blocks are never surfaced
/// through this type; malformed blocks are skipped at the record level.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket setup or send failure.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// HTTP-level failure while probing a device.
    #[error("network error: {0}")]
    Network(String),

    /// A device description document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Convenience Result alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
