//! Multicast probe-and-collect discovery over an address cache.
//!
//! [`DeviceCollection`] is the discovery engine: it sends one M-SEARCH probe,
//! collects responses for a fixed window, and turns matching responses into a
//! deduplicated set of device addresses. Every newly observed address is
//! written through to the [`AddressCache`] immediately, so a crash
//! mid-discovery does not lose previously found devices.

use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cache::{AddressCache, ADDRESS_CACHE_KEY};
use crate::error::Result;
use crate::ssdp::{
    build_msearch, host_of, parse_response_blocks, MulticastSocket, SsdpSocket,
    DEFAULT_MULTICAST_ADDR, SEARCH_TARGET,
};

/// Network configuration for one discovery run.
///
/// Passed explicitly into discovery rather than held as shared mutable state,
/// so runs stay referentially transparent and easy to fake.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryConfig {
    /// Multicast group the probe is addressed to.
    pub multicast_addr: SocketAddrV4,
    /// Collection window: how long to keep accepting responses.
    pub window: Duration,
    /// Outgoing interface for multi-homed hosts.
    pub interface: Option<Ipv4Addr>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            multicast_addr: DEFAULT_MULTICAST_ADDR,
            window: Duration::from_secs(1),
            interface: None,
        }
    }
}

/// Source of device addresses consumed by the directory layer.
///
/// Implemented by [`DeviceCollection`]; tests substitute a canned provider.
pub trait DeviceProvider {
    /// All known device addresses, discovering if none are known yet.
    fn addresses(&mut self) -> Result<BTreeSet<Ipv4Addr>>;

    /// Forget the in-memory address set, forcing the next call to consult
    /// the cache or the network again.
    fn clear(&mut self);
}

/// Manages the set of devices on the network.
pub struct DeviceCollection {
    cache: Box<dyn AddressCache>,
    config: DiscoveryConfig,
    addresses: BTreeSet<Ipv4Addr>,
}

impl DeviceCollection {
    pub fn new(cache: Box<dyn AddressCache>) -> Self {
        Self::with_config(cache, DiscoveryConfig::default())
    }

    pub fn with_config(cache: Box<dyn AddressCache>, config: DiscoveryConfig) -> Self {
        Self {
            cache,
            config,
            addresses: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run a discovery round over a freshly opened multicast socket.
    pub fn discover(&mut self) -> Result<BTreeSet<Ipv4Addr>> {
        let mut socket = MulticastSocket::open(self.config.interface)?;
        self.discover_with(&mut socket)
    }

    /// Run a discovery round over the given socket.
    ///
    /// Zero responses within the window is not an error: the result is an
    /// empty set and the cache is left untouched.
    pub fn discover_with(&mut self, socket: &mut dyn SsdpSocket) -> Result<BTreeSet<Ipv4Addr>> {
        info!(address = %self.config.multicast_addr, "discovering devices");

        let probe = build_msearch(self.config.multicast_addr);
        socket.send_to(probe.as_bytes(), self.config.multicast_addr)?;

        let buffer = collect_responses(socket, self.config.window);

        // uuid -> first location seen, for dedup by unique identifier
        let mut seen: HashMap<String, String> = HashMap::new();
        for headers in parse_response_blocks(&buffer) {
            let Some(st) = headers.get("st") else { continue };
            if st != SEARCH_TARGET {
                continue;
            }
            let (Some(usn), Some(location)) = (headers.get("usn"), headers.get("location"))
            else {
                continue;
            };

            if let Some(first) = seen.get(usn) {
                if first != location {
                    // A later duplicate with a different LOCATION could mean
                    // the device changed address mid-scan; the first response
                    // still wins.
                    warn!(%usn, %first, %location, "duplicate USN with conflicting location");
                }
                continue;
            }
            seen.insert(usn.clone(), location.clone());

            let Some(ip) = host_of(location) else { continue };
            debug!(%usn, %ip, "found device");
            self.add_address(ip);
        }

        Ok(self.addresses.clone())
    }

    /// Record a device address, persisting the set when it is new.
    pub fn add_address(&mut self, ip: Ipv4Addr) {
        if self.addresses.insert(ip) {
            self.cache.save(ADDRESS_CACHE_KEY, &self.addresses);
        }
    }
}

impl DeviceProvider for DeviceCollection {
    fn addresses(&mut self) -> Result<BTreeSet<Ipv4Addr>> {
        if self.addresses.is_empty() {
            match self.cache.fetch(ADDRESS_CACHE_KEY) {
                Some(cached) if !cached.is_empty() => {
                    info!(count = cached.len(), "loaded device addresses from cache");
                    self.addresses = cached;
                }
                _ => {
                    self.discover()?;
                }
            }
        }
        Ok(self.addresses.clone())
    }

    fn clear(&mut self) {
        self.addresses.clear();
    }
}

/// Blocking collection loop bounded by `window`.
///
/// Every datagram received before the window elapses is appended to the
/// buffer. The loop stops promptly at expiry; an in-flight read never gets a
/// timeout longer than the remaining window.
fn collect_responses(socket: &mut dyn SsdpSocket, window: Duration) -> String {
    let deadline = Instant::now() + window;
    let mut buffer = String::new();
    let mut datagram = [0u8; 2048];

    loop {
        let Some(remaining) = deadline.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
        else {
            break;
        };
        match socket.recv_timeout(&mut datagram, remaining) {
            Ok(len) => buffer.push_str(&String::from_utf8_lossy(&datagram[..len])),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => break,
            Err(e) => {
                warn!(error = %e, "socket error while collecting responses");
                break;
            }
        }
    }

    buffer
}
