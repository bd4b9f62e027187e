//! Error types for topology resolution.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Error type for topology operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// No playback-capable device was available to ask for the topology.
    #[error("no playback-capable device available to source the topology")]
    NoSourceDevice,

    /// The device chosen as topology source did not answer. Unlike a failed
    /// capability probe this is fatal: without the document there is no
    /// topology at all.
    #[error("failed to fetch topology from {address}: {message}")]
    SourceUnreachable { address: Ipv4Addr, message: String },

    /// The topology document could not be parsed.
    #[error("topology document could not be parsed: {0}")]
    Parse(String),

    /// The HTTP transport could not be set up.
    #[error("transport setup failed: {0}")]
    Transport(String),

    /// A group violated the one-coordinator rule.
    #[error("group {group} has {count} coordinators, expected exactly one")]
    CoordinatorCount { group: String, count: usize },

    /// A playback-capable device was absent from the reported topology.
    #[error("playback-capable device {0} missing from reported topology")]
    DeviceMissing(Ipv4Addr),
}

/// Convenience Result alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;
