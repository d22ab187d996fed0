//! Network change events
//!
//! These are produced by the notification decoder and consumed by the
//! sequencer. Interface names are always resolved names, never indices.

use std::fmt;
use std::net::Ipv4Addr;

/// A single decoded network configuration change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An IPv4 local address was added to or removed from an interface
    Address(AddressEvent),
    /// An interface changed state
    Link(LinkEvent),
    /// An IPv4 route was added or removed
    Route(RouteEvent),
}

/// Address added/removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressOp {
    Added,
    Removed,
}

/// Link administrative state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    Up,
    Down,
}

/// Route added/removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteOp {
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEvent {
    pub op: AddressOp,
    pub interface: String,
    pub address: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    pub state: LinkState,
    pub interface: String,
}

/// Route change
///
/// `destination` and `gateway` are `None` when the kernel message carried no
/// such attribute (e.g. the default route has no destination).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEvent {
    pub op: RouteOp,
    pub destination: Option<Ipv4Addr>,
    pub gateway: Option<Ipv4Addr>,
}

impl Event {
    pub fn address(op: AddressOp, interface: impl Into<String>, address: Ipv4Addr) -> Self {
        Event::Address(AddressEvent {
            op,
            interface: interface.into(),
            address,
        })
    }

    pub fn link(state: LinkState, interface: impl Into<String>) -> Self {
        Event::Link(LinkEvent {
            state,
            interface: interface.into(),
        })
    }

    pub fn route(op: RouteOp, destination: Option<Ipv4Addr>, gateway: Option<Ipv4Addr>) -> Self {
        Event::Route(RouteEvent {
            op,
            destination,
            gateway,
        })
    }

    /// Protocol module name (`ip`, `link` or `route`)
    pub fn module(&self) -> &'static str {
        match self {
            Event::Address(_) => "ip",
            Event::Link(_) => "link",
            Event::Route(_) => "route",
        }
    }
}

impl AddressOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressOp::Added => "add",
            AddressOp::Removed => "del",
        }
    }
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Up => "up",
            LinkState::Down => "down",
        }
    }
}

impl RouteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteOp::Added => "add",
            RouteOp::Removed => "del",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::codec::encode(self))
    }
}
