//! SSDP (Simple Service Discovery Protocol) client
//!
//! Sends M-SEARCH requests and turns the unicast replies into
//! [`Advertisement`]s. The sender address of each reply is recorded under
//! the `_host` header so later lookups do not have to re-parse the
//! location URL.

use std::collections::BTreeMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{DiscoveryError, Result};
use crate::{Advertisement, HEADER_HOST};

const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// SSDP response containing the headers of one reply
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SsdpResponse {
    pub location: String,
    pub st: String,
    pub usn: String,
    pub server: Option<String>,
    /// Every header of the reply, keyed by lowercase name
    pub headers: BTreeMap<String, String>,
}

impl SsdpResponse {
    /// Convert the reply into an advertisement, tagging it with the sender's address
    pub fn into_advertisement(self, sender: Option<SocketAddr>) -> Advertisement {
        let mut advertisement = Advertisement::new(self.usn, self.st).with_location(self.location);
        for (name, value) in self.headers {
            advertisement = advertisement.with_header(name, value);
        }
        if let Some(addr) = sender {
            advertisement = advertisement.with_header(HEADER_HOST, addr.ip().to_string());
        }
        advertisement
    }
}

/// SSDP client for device discovery
pub(crate) struct SsdpClient {
    socket: UdpSocket,
}

impl SsdpClient {
    /// Create a new SSDP client with the specified timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to bind UDP socket: {}", e)))?;

        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set read timeout: {}", e)))?;

        socket
            .set_multicast_loop_v4(true)
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set multicast loop: {}", e)))?;

        Ok(Self { socket })
    }

    /// Send an M-SEARCH request and return an iterator of responses
    pub fn search(&self, search_target: &str) -> Result<SsdpResponseIterator<'_>> {
        let request = build_msearch(search_target);

        debug!(search_target, "sending M-SEARCH");
        self.socket
            .send_to(request.as_bytes(), SSDP_MULTICAST_ADDR)
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to send M-SEARCH: {}", e)))?;

        Ok(SsdpResponseIterator::new(&self.socket))
    }
}

fn build_msearch(search_target: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 2\r\n\
         ST: {}\r\n\
         USER-AGENT: rxv-setup/1.0 UPnP/1.0\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, search_target
    )
}

/// Iterator for SSDP responses, yielding the reply and its sender
pub(crate) struct SsdpResponseIterator<'a> {
    socket: &'a UdpSocket,
    buffer: [u8; 2048],
    finished: bool,
}

impl<'a> SsdpResponseIterator<'a> {
    fn new(socket: &'a UdpSocket) -> Self {
        Self {
            socket,
            buffer: [0; 2048],
            finished: false,
        }
    }
}

impl<'a> Iterator for SsdpResponseIterator<'a> {
    type Item = Result<(SsdpResponse, SocketAddr)>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.socket.recv_from(&mut self.buffer) {
                Ok((size, sender)) => {
                    let Ok(text) = std::str::from_utf8(&self.buffer[..size]) else {
                        trace!(%sender, "skipping non-UTF-8 SSDP reply");
                        continue;
                    };
                    match parse_ssdp_response(text) {
                        Some(response) => return Some(Ok((response, sender))),
                        None => trace!(%sender, "skipping incomplete SSDP reply"),
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    self.finished = true;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(DiscoveryError::NetworkError(format!("Socket error: {}", e))));
                }
            }
        }
        None
    }
}

/// Parse an SSDP response from HTTP text
///
/// Returns `None` unless LOCATION, ST and USN are all present.
pub(crate) fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
    let mut headers = BTreeMap::new();

    for line in response.lines().skip(1) {
        if let Some((name, value)) = split_header(line.trim()) {
            headers.insert(name, value);
        }
    }

    let location = headers.get("location")?.clone();
    let st = headers.get("st")?.clone();
    let usn = headers.get("usn")?.clone();
    let server = headers.get("server").cloned();

    Some(SsdpResponse {
        location,
        st,
        usn,
        server,
        headers,
    })
}

/// Split a line like "HEADER: value" into a lowercase name and trimmed value
fn split_header(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains(' ') {
        return None;
    }
    Some((name.to_ascii_lowercase(), value.trim().to_string()))
}
