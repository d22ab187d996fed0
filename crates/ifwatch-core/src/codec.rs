// # Line Protocol
//
// One event per newline-terminated ASCII line:
//
// ```text
// ip:<add|del>:<interface>:<address>
// link:<up|down>:<interface>
// route:<add|del>:<destination>:<gateway>
// ```
//
// Absent route fields are written as empty fields (`route:add::10.0.0.1`).
// There is no escaping: a `:` inside a field breaks framing.

use std::net::Ipv4Addr;

use thiserror::Error;
use tracing::trace;

use crate::event::{AddressOp, Event, LinkState, RouteOp};

/// Maximum bytes of an interface name on the wire (`IFNAMSIZ`)
pub const MAX_INTERFACE_LEN: usize = 16;

/// Maximum bytes of an IPv4 address on the wire (`INET_ADDRSTRLEN`)
pub const MAX_ADDRESS_LEN: usize = 16;

/// Fields beyond this count are dropped when decoding
pub const MAX_FIELDS: usize = 10;

/// Why a line could not be turned into an [`Event`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("unknown operation '{op}' for module '{module}'")]
    UnknownOp { module: &'static str, op: String },

    #[error("missing field '{field}' in '{module}' line")]
    MissingField {
        module: &'static str,
        field: &'static str,
    },

    #[error("invalid IPv4 address '{value}' in field '{field}'")]
    InvalidAddress { field: &'static str, value: String },
}

/// Serialize an event to its protocol line (without the trailing newline)
pub fn encode(event: &Event) -> String {
    match event {
        Event::Address(e) => format!(
            "{}:{}:{}:{}",
            event.module(),
            e.op.as_str(),
            truncate(&e.interface, MAX_INTERFACE_LEN),
            address_field(Some(e.address)),
        ),
        Event::Link(e) => format!(
            "{}:{}:{}",
            event.module(),
            e.state.as_str(),
            truncate(&e.interface, MAX_INTERFACE_LEN),
        ),
        Event::Route(e) => format!(
            "{}:{}:{}:{}",
            event.module(),
            e.op.as_str(),
            address_field(e.destination),
            address_field(e.gateway),
        ),
    }
}

/// Parse a protocol line
///
/// Returns `Ok(None)` for lines with fewer than two fields (blank lines,
/// a bare module name): those carry nothing to act on and are skipped.
/// A trailing `\n` or `\r\n` is ignored.
pub fn decode(line: &str) -> Result<Option<Event>, LineError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let fields: Vec<&str> = line.split(':').take(MAX_FIELDS).collect();
    for (i, field) in fields.iter().enumerate() {
        trace!("field[{}] = {:?}", i, field);
    }

    if fields.len() < 2 {
        return Ok(None);
    }

    let event = match fields[0] {
        "ip" => {
            let op = match fields[1] {
                "add" => AddressOp::Added,
                "del" => AddressOp::Removed,
                other => return Err(unknown_op("ip", other)),
            };
            let interface = field(&fields, 2, "ip", "interface")?;
            let address = field(&fields, 3, "ip", "address")?;
            let address = parse_address("address", address)?.ok_or(LineError::MissingField {
                module: "ip",
                field: "address",
            })?;
            Event::address(op, interface, address)
        }
        "link" => {
            let state = match fields[1] {
                "up" => LinkState::Up,
                "down" => LinkState::Down,
                other => return Err(unknown_op("link", other)),
            };
            let interface = field(&fields, 2, "link", "interface")?;
            Event::link(state, interface)
        }
        "route" => {
            let op = match fields[1] {
                "add" => RouteOp::Added,
                "del" => RouteOp::Removed,
                other => return Err(unknown_op("route", other)),
            };
            let destination = field(&fields, 2, "route", "destination")?;
            let gateway = field(&fields, 3, "route", "gateway")?;
            Event::route(
                op,
                parse_address("destination", destination)?,
                parse_address("gateway", gateway)?,
            )
        }
        other => return Err(LineError::UnknownModule(other.to_string())),
    };

    Ok(Some(event))
}

fn field<'a>(
    fields: &[&'a str],
    index: usize,
    module: &'static str,
    name: &'static str,
) -> Result<&'a str, LineError> {
    fields
        .get(index)
        .copied()
        .ok_or(LineError::MissingField { module, field: name })
}

fn unknown_op(module: &'static str, op: &str) -> LineError {
    LineError::UnknownOp {
        module,
        op: op.to_string(),
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Option<Ipv4Addr>, LineError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| LineError::InvalidAddress {
            field,
            value: value.to_string(),
        })
}

fn address_field(address: Option<Ipv4Addr>) -> String {
    match address {
        Some(address) => truncate(&address.to_string(), MAX_ADDRESS_LEN).to_string(),
        None => String::new(),
    }
}

/// Cut `value` to at most `max` bytes without splitting a character
fn truncate(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
