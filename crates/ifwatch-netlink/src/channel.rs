//! rtnetlink notification channel (Linux only)

use ifwatch_core::{Error, Result};
use netlink_sys::protocols::NETLINK_ROUTE;
use netlink_sys::{Socket, SocketAddr};
use tracing::info;

use crate::DatagramSource;

/// Size of the receive buffer; larger datagrams are truncated by the kernel
pub const RECV_BUFFER_SIZE: usize = 4096;

/// Multicast groups the channel subscribes to
pub const GROUPS: u32 =
    (libc::RTMGRP_IPV4_IFADDR | libc::RTMGRP_IPV4_ROUTE | libc::RTMGRP_LINK) as u32;

/// A `NETLINK_ROUTE` socket bound to the IPv4 address, IPv4 route and link
/// groups
///
/// Read-only: nothing is ever sent on it.
pub struct NotificationChannel {
    socket: Socket,
    buffer: Vec<u8>,
}

impl NotificationChannel {
    /// Open and bind the channel
    pub fn open() -> Result<Self> {
        let mut socket = Socket::new(NETLINK_ROUTE)
            .map_err(|e| Error::channel(format!("couldn't open NETLINK_ROUTE socket: {}", e)))?;

        socket
            .bind(&SocketAddr::new(0, GROUPS))
            .map_err(|e| Error::channel(format!("couldn't bind: {}", e)))?;

        info!("Subscribed to rtnetlink groups {:#x}", GROUPS);

        Ok(Self {
            socket,
            buffer: vec![0; RECV_BUFFER_SIZE],
        })
    }
}

impl DatagramSource for NotificationChannel {
    fn recv(&mut self) -> Result<&[u8]> {
        let len = self
            .socket
            .recv(&mut &mut self.buffer[..], 0)
            .map_err(|e| Error::channel(format!("recv failed: {}", e)))?;

        if len == 0 {
            return Err(Error::channel("notification channel closed"));
        }
        Ok(&self.buffer[..len])
    }
}
