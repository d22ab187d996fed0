// # Netlink Notification Decoder
//
// This crate turns Linux rtnetlink notifications into ifwatch events.
//
// ## Implementation
//
// 1. `netlink-sys` opens a `NETLINK_ROUTE` socket bound to
//    RTMGRP_IPV4_IFADDR | RTMGRP_IPV4_ROUTE | RTMGRP_LINK
// 2. Each datagram is split into messages and parsed with
//    `netlink-packet-route`
// 3. Interface indices are resolved to names before events leave the crate
//
// The loop is blocking and single-threaded. It ends only when the channel
// fails or closes, or when the sink refuses an event; there is no retry and
// no reconnection.
//
// ## Platform Support
//
// The decoder itself is pure and builds everywhere (which keeps it testable);
// the socket is Linux only.

pub mod decoder;
pub mod resolver;

#[cfg(target_os = "linux")]
pub mod channel;

use ifwatch_core::{Event, Result};
use tracing::debug;

pub use decoder::decode_datagram;
pub use resolver::{InterfaceResolver, SystemResolver};

#[cfg(target_os = "linux")]
pub use channel::NotificationChannel;

/// Something that yields raw rtnetlink datagrams
pub trait DatagramSource {
    /// Block until the next datagram arrives
    ///
    /// An error ends the watch loop.
    fn recv(&mut self) -> Result<&[u8]>;
}

/// The receive → decode → emit loop
pub struct Watcher<S, R> {
    source: S,
    resolver: R,
}

impl<S: DatagramSource, R: InterfaceResolver> Watcher<S, R> {
    pub fn new(source: S, resolver: R) -> Self {
        Self { source, resolver }
    }

    /// Run until the source fails or `sink` returns an error
    ///
    /// Never returns `Ok`.
    pub fn run<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(&Event) -> std::io::Result<()>,
    {
        loop {
            let datagram = self.source.recv()?;
            debug!("Received {} byte datagram", datagram.len());

            for event in decode_datagram(datagram, &self.resolver) {
                sink(&event)?;
            }
        }
    }
}

#[cfg(target_os = "linux")]
impl Watcher<NotificationChannel, SystemResolver> {
    /// Open the kernel channel with system name resolution
    pub fn open() -> Result<Self> {
        Ok(Self::new(NotificationChannel::open()?, SystemResolver))
    }
}
