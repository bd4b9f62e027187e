//! SSDP probe construction, response parsing, and the multicast socket seam.
//!
//! The wire format is HTTP-request-line framing over UDP: a single M-SEARCH
//! probe goes out to the multicast group, and devices reply with
//! HTTP-response-like text blocks separated by a blank line. Header keys are
//! case-insensitive; parsing folds them to lowercase.

use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::Result;

/// SSDP search target identifying the playback device class.
pub const SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// Default SSDP multicast group and port.
pub const DEFAULT_MULTICAST_ADDR: SocketAddrV4 =
    SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900);

/// Build the M-SEARCH probe datagram.
///
/// The HOST header always names the multicast group, and MX hints the maximum
/// number of seconds a device may wait before replying.
pub fn build_msearch(multicast_addr: SocketAddrV4) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {multicast_addr}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 1\r\n\
         ST: {SEARCH_TARGET}\r\n\
         \r\n"
    )
}

/// Minimal socket surface the discovery engine needs.
///
/// Keeping this a trait lets tests inject a scripted fake instead of touching
/// the network.
pub trait SsdpSocket {
    /// Send one datagram to `target`.
    fn send_to(&mut self, buf: &[u8], target: SocketAddrV4) -> io::Result<usize>;

    /// Wait up to `timeout` for one datagram. A timeout surfaces as
    /// `WouldBlock` or `TimedOut`, depending on the platform.
    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

/// UDP socket configured for multicast SSDP.
#[derive(Debug)]
pub struct MulticastSocket {
    inner: UdpSocket,
}

impl MulticastSocket {
    /// Open a socket bound for multicast send.
    ///
    /// When `interface` is given, the IP_MULTICAST_IF option is set before
    /// the socket is handed out. Multi-homed hosts need this; the OS would
    /// otherwise pick an arbitrary egress interface.
    pub fn open(interface: Option<Ipv4Addr>) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_multicast_ttl_v4(2)?;
        if let Some(addr) = interface {
            socket.set_multicast_if_v4(&addr)?;
        }
        let bind_addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, 0).into();
        socket.bind(&bind_addr.into())?;
        Ok(Self {
            inner: socket.into(),
        })
    }
}

impl SsdpSocket for MulticastSocket {
    fn send_to(&mut self, buf: &[u8], target: SocketAddrV4) -> io::Result<usize> {
        self.inner.send_to(buf, target)
    }

    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        // A zero Duration would mean "no timeout" to the OS.
        let timeout = timeout.max(Duration::from_millis(1));
        self.inner.set_read_timeout(Some(timeout))?;
        let (len, _src) = self.inner.recv_from(buf)?;
        Ok(len)
    }
}

/// Parse a buffer of collected responses into one header map per block.
///
/// Blocks are separated by a blank line. Within a block, each `name: value`
/// line becomes a lowercased-key/trimmed-value entry; lines without a header
/// separator (the status line included) are ignored. Blocks yielding no
/// headers are dropped; partial or corrupt datagrams must not abort the run.
pub fn parse_response_blocks(buffer: &str) -> Vec<HashMap<String, String>> {
    let mut blocks = Vec::new();

    for reply in buffer.split("\r\n\r\n") {
        if reply.is_empty() {
            continue;
        }

        let mut headers = HashMap::new();
        for line in reply.split("\r\n") {
            let Some(pos) = line.find(':').filter(|&pos| pos > 0) else {
                continue;
            };
            let key = line[..pos].trim().to_ascii_lowercase();
            let value = line[pos + 1..].trim().to_string();
            headers.insert(key, value);
        }

        if !headers.is_empty() {
            blocks.push(headers);
        }
    }

    blocks
}

/// Extract the host portion of a LOCATION URL as an IPv4 address.
pub fn host_of(url: &str) -> Option<Ipv4Addr> {
    url.split("//")
        .nth(1)?
        .split(|c: char| c == ':' || c == '/')
        .next()?
        .parse()
        .ok()
}

/// Scripted in-memory socket for exercising discovery without a network.
#[derive(Debug, Default)]
pub struct FakeSocket {
    datagrams: Vec<Vec<u8>>,
    next: usize,
    pub sent: Vec<(Vec<u8>, SocketAddrV4)>,
}

impl FakeSocket {
    pub fn new(datagrams: Vec<&str>) -> Self {
        Self {
            datagrams: datagrams.into_iter().map(|d| d.as_bytes().to_vec()).collect(),
            next: 0,
            sent: Vec::new(),
        }
    }
}

impl SsdpSocket for FakeSocket {
    fn send_to(&mut self, buf: &[u8], target: SocketAddrV4) -> io::Result<usize> {
        self.sent.push((buf.to_vec(), target));
        Ok(buf.len())
    }

    fn recv_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        let Some(datagram) = self.datagrams.get(self.next) else {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        };
        self.next += 1;
        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msearch_carries_fixed_header_set() {
        let probe = build_msearch(DEFAULT_MULTICAST_ADDR);
        assert!(probe.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(probe.contains("HOST: 239.255.255.250:1900\r\n"));
        assert!(probe.contains("MAN: \"ssdp:discover\"\r\n"));
        assert!(probe.contains("MX: 1\r\n"));
        assert!(probe.contains(&format!("ST: {SEARCH_TARGET}\r\n")));
    }

    #[test]
    fn parses_multiple_blocks_with_case_folded_keys() {
        let buffer = "HTTP/1.1 200 OK\r\n\
            LOCATION: http://10.0.0.5:1400/xml\r\n\
            st: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            Usn: uuid:RINCON_A\r\n\
            \r\n\
            HTTP/1.1 200 OK\r\n\
            location: http://10.0.0.6:1400/xml\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            USN: uuid:RINCON_B\r\n\
            \r\n";

        let blocks = parse_response_blocks(buffer);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["location"], "http://10.0.0.5:1400/xml");
        assert_eq!(blocks[0]["usn"], "uuid:RINCON_A");
        assert_eq!(blocks[1]["location"], "http://10.0.0.6:1400/xml");
    }

    #[test]
    fn values_are_trimmed() {
        let blocks = parse_response_blocks("LOCATION:    http://10.0.0.5:1400/xml   \r\n\r\n");
        assert_eq!(blocks[0]["location"], "http://10.0.0.5:1400/xml");
    }

    #[test]
    fn headerless_blocks_are_dropped() {
        let blocks = parse_response_blocks("no separator here\r\nstill none\r\n\r\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn empty_buffer_yields_no_blocks() {
        assert!(parse_response_blocks("").is_empty());
    }

    #[test]
    fn host_extraction() {
        assert_eq!(
            host_of("http://10.0.0.5:1400/xml/device_description.xml"),
            Some(Ipv4Addr::new(10, 0, 0, 5))
        );
        assert_eq!(host_of("http://192.168.1.20/desc"), Some(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("http://speaker.local:1400/xml"), None);
    }
}
