// # Datagram Decoder
//
// Turns one rtnetlink datagram into [`Event`]s.
//
// A datagram carries one or more netlink messages back to back, each padded
// to 4 bytes. Iteration stops at `NLMSG_DONE` or at the first header whose
// length is not self-consistent (shorter than a header, longer than what is
// left). A message whose body fails to decode is skipped on its own.
//
// Per message type:
// - address add/del: one event per `IFA_LOCAL` attribute
// - link new/del: one event per attribute record (content is not inspected)
// - route add/del: one event combining `RTA_DST` and `RTA_GATEWAY`

use std::net::Ipv4Addr;

use ifwatch_core::{AddressOp, Event, LinkState, RouteOp};
use netlink_packet_core::{NLMSG_DONE, NetlinkBuffer, NetlinkMessage, NetlinkPayload};
use netlink_packet_route::nlas::address::Nla as AddressNla;
use netlink_packet_route::nlas::route::Nla as RouteNla;
use netlink_packet_route::{AddressMessage, IFF_UP, LinkMessage, RouteMessage, RtnlMessage};
use tracing::{debug, trace};

use crate::resolver::InterfaceResolver;

/// Netlink message alignment
const NLMSG_ALIGNTO: usize = 4;

fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Decode every message of a datagram, in order
pub fn decode_datagram(bytes: &[u8], resolver: &dyn InterfaceResolver) -> Vec<Event> {
    let mut events = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let remaining = &bytes[offset..];
        let buffer = match NetlinkBuffer::new_checked(remaining) {
            Ok(buffer) => buffer,
            Err(e) => {
                debug!("Dropping {} trailing bytes: {:?}", remaining.len(), e);
                break;
            }
        };

        let length = buffer.length() as usize;
        let message_type = buffer.message_type();
        if message_type == NLMSG_DONE {
            break;
        }

        match NetlinkMessage::<RtnlMessage>::deserialize(&remaining[..length]) {
            Ok(message) => decode_message(message, resolver, &mut events),
            Err(e) => debug!("Skipping malformed message of type {}: {:?}", message_type, e),
        }

        offset += nlmsg_align(length);
    }

    events
}

fn decode_message(
    message: NetlinkMessage<RtnlMessage>,
    resolver: &dyn InterfaceResolver,
    events: &mut Vec<Event>,
) {
    let NetlinkPayload::InnerMessage(inner) = message.payload else {
        trace!("Ignoring control message of type {}", message.header.message_type);
        return;
    };

    match inner {
        RtnlMessage::NewAddress(msg) => on_address(AddressOp::Added, &msg, resolver, events),
        RtnlMessage::DelAddress(msg) => on_address(AddressOp::Removed, &msg, resolver, events),
        RtnlMessage::NewLink(msg) | RtnlMessage::DelLink(msg) => on_link(&msg, resolver, events),
        RtnlMessage::NewRoute(msg) => on_route(RouteOp::Added, &msg, events),
        RtnlMessage::DelRoute(msg) => on_route(RouteOp::Removed, &msg, events),
        other => trace!("Ignoring message {:?}", other),
    }
}

fn on_address(
    op: AddressOp,
    msg: &AddressMessage,
    resolver: &dyn InterfaceResolver,
    events: &mut Vec<Event>,
) {
    for nla in &msg.nlas {
        let AddressNla::Local(bytes) = nla else {
            continue;
        };
        let address = ipv4(bytes).unwrap_or(Ipv4Addr::UNSPECIFIED);
        events.push(Event::address(op, interface_name(resolver, msg.header.index), address));
    }
}

fn on_link(msg: &LinkMessage, resolver: &dyn InterfaceResolver, events: &mut Vec<Event>) {
    let state = if msg.header.flags & IFF_UP != 0 {
        LinkState::Up
    } else {
        LinkState::Down
    };

    // One event per attribute record, whatever the attribute is.
    for _ in &msg.nlas {
        events.push(Event::link(state, interface_name(resolver, msg.header.index)));
    }
}

fn on_route(op: RouteOp, msg: &RouteMessage, events: &mut Vec<Event>) {
    let mut destination = None;
    let mut gateway = None;

    for nla in &msg.nlas {
        match nla {
            RouteNla::Destination(bytes) => destination = ipv4(bytes),
            RouteNla::Gateway(bytes) => gateway = ipv4(bytes),
            _ => {}
        }
    }

    events.push(Event::route(op, destination, gateway));
}

/// Unresolvable indices map to an empty name
fn interface_name(resolver: &dyn InterfaceResolver, index: u32) -> String {
    resolver.name_of(index).unwrap_or_default()
}

fn ipv4(bytes: &[u8]) -> Option<Ipv4Addr> {
    <[u8; 4]>::try_from(bytes).ok().map(Ipv4Addr::from)
}
