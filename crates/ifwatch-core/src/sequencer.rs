//! Event sequencer
//!
//! Correlates the ordered subsequence
//!
//! ```text
//! Initial ──link:up:<target>──▶ LinkUp ──route:add──▶ RouteSeen ──ip:add──▶ Initial
//!                                                                 (trigger)
//! ```
//!
//! into a single trigger of the [`ActionInvoker`]. Events that do not match
//! the expected transition are ignored and never move the state backwards.
//!
//! Route and address values are deliberately not checked against the target
//! interface: any route add after the link came up advances the sequence, and
//! any address add after that completes it. Because there is no timeout by
//! default, a half-finished sequence can be completed much later by an
//! unrelated route/address change. [`Sequencer::with_timeout`] opts into
//! expiring stale sequences.
//!
//! Repeated identical notifications are debounced against the last address
//! acted upon.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::action::ActionInvoker;
use crate::codec;
use crate::event::{AddressOp, Event, LinkState, RouteOp};

/// Position in the link-up → route-add → address-add sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SequencerState {
    #[default]
    Initial,
    LinkUp,
    RouteSeen,
}

/// Outcome of feeding one event to the sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEvent {
    /// The event did not match the expected transition
    Ignored,

    /// The sequence moved forward
    Advanced {
        from: SequencerState,
        to: SequencerState,
    },

    /// The sequence completed and the action was started
    Triggered { address: Ipv4Addr },

    /// The sequence completed with the address already acted upon
    DuplicateSuppressed { address: Ipv4Addr },

    /// The sequence completed but the action could not be started
    TriggerFailed { address: Ipv4Addr, error: String },

    /// A partial sequence was older than the configured timeout and was reset
    SequenceExpired { state: SequencerState },
}

/// Everything that happened while handling one line or event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Set when a stale partial sequence was reset before the event was seen
    pub expired: Option<SequencerEvent>,

    /// What the event itself did
    pub outcome: SequencerEvent,
}

impl Step {
    fn ignored() -> Self {
        Self {
            expired: None,
            outcome: SequencerEvent::Ignored,
        }
    }

    /// Observable events in order, leaving out `Ignored`
    pub fn events(self) -> impl Iterator<Item = SequencerEvent> {
        self.expired
            .into_iter()
            .chain(Some(self.outcome))
            .filter(|event| *event != SequencerEvent::Ignored)
    }
}

/// The link-up → route-add → address-add state machine
///
/// Owns the current [`SequencerState`] and the last triggered address. One
/// instance is created at startup and driven by a single consumer.
pub struct Sequencer {
    interface: String,
    invoker: Box<dyn ActionInvoker>,
    state: SequencerState,
    last_address: Option<Ipv4Addr>,
    timeout: Option<Duration>,
    started_at: Option<Instant>,
}

impl Sequencer {
    /// Create a sequencer watching `interface`
    pub fn new(interface: impl Into<String>, invoker: Box<dyn ActionInvoker>) -> Self {
        Self {
            interface: interface.into(),
            invoker,
            state: SequencerState::Initial,
            last_address: None,
            timeout: None,
            started_at: None,
        }
    }

    /// Reset partial sequences that have been pending longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Seed the last triggered address, e.g. with a value known from a previous run
    pub fn with_last_address(mut self, address: Option<Ipv4Addr>) -> Self {
        self.last_address = address;
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn last_address(&self) -> Option<Ipv4Addr> {
        self.last_address
    }

    /// Decode a protocol line and feed it to the sequencer
    ///
    /// Blank, partial and malformed lines are logged and ignored.
    pub fn handle_line(&mut self, line: &str) -> Step {
        self.handle_line_at(line, Instant::now())
    }

    /// Decode a protocol line received at `now` and feed it to the sequencer
    ///
    /// Lines that do not decode to an event never expire a pending sequence.
    pub fn handle_line_at(&mut self, line: &str, now: Instant) -> Step {
        match codec::decode(line) {
            Ok(Some(event)) => self.handle_event_at(&event, now),
            Ok(None) => Step::ignored(),
            Err(e) => {
                debug!("Ignoring line {:?}: {}", line, e);
                Step::ignored()
            }
        }
    }

    /// Feed one event to the sequencer
    pub fn handle_event(&mut self, event: &Event) -> Step {
        self.handle_event_at(event, Instant::now())
    }

    /// Feed one event observed at `now`
    ///
    /// A pending sequence older than the timeout is reset first, so the event
    /// is evaluated against the fresh state.
    pub fn handle_event_at(&mut self, event: &Event, now: Instant) -> Step {
        let expired = self.expire_at(now);
        let outcome = self.transition(event, now);
        Step { expired, outcome }
    }

    fn transition(&mut self, event: &Event, now: Instant) -> SequencerEvent {
        match (self.state, event) {
            (SequencerState::Initial, Event::Link(link))
                if link.state == LinkState::Up && link.interface == self.interface =>
            {
                info!("Link up on {}", link.interface);
                self.started_at = Some(now);
                self.advance(SequencerState::LinkUp)
            }
            (SequencerState::LinkUp, Event::Route(route)) if route.op == RouteOp::Added => {
                info!(
                    "Route added (destination: {:?}, gateway: {:?})",
                    route.destination, route.gateway
                );
                self.advance(SequencerState::RouteSeen)
            }
            (SequencerState::RouteSeen, Event::Address(addr)) if addr.op == AddressOp::Added => {
                self.complete(addr.address)
            }
            _ => {
                debug!("Ignoring {} in state {:?}", event, self.state);
                SequencerEvent::Ignored
            }
        }
    }

    /// Reset a partial sequence older than the timeout
    ///
    /// Returns the expired state, or `None` if nothing was reset. Always
    /// `None` when no timeout is configured.
    pub fn expire_at(&mut self, now: Instant) -> Option<SequencerEvent> {
        let timeout = self.timeout?;
        let started_at = self.started_at?;
        if self.state == SequencerState::Initial
            || now.saturating_duration_since(started_at) <= timeout
        {
            return None;
        }

        let state = self.state;
        info!("Sequence stuck in {:?} for more than {:?}, resetting", state, timeout);
        self.reset();
        Some(SequencerEvent::SequenceExpired { state })
    }

    fn advance(&mut self, to: SequencerState) -> SequencerEvent {
        let from = self.state;
        self.state = to;
        SequencerEvent::Advanced { from, to }
    }

    fn complete(&mut self, address: Ipv4Addr) -> SequencerEvent {
        info!("New address {} on sequence completion", address);

        if self.last_address == Some(address) {
            info!("Aborting update, old address {} == new address {}", address, address);
            return SequencerEvent::DuplicateSuppressed { address };
        }

        self.last_address = Some(address);
        let outcome = match self.invoker.invoke(address) {
            Ok(()) => SequencerEvent::Triggered { address },
            Err(e) => {
                error!("Failed to invoke action for {}: {}", address, e);
                SequencerEvent::TriggerFailed {
                    address,
                    error: e.to_string(),
                }
            }
        };

        self.reset();
        outcome
    }

    fn reset(&mut self) {
        self.state = SequencerState::Initial;
        self.started_at = None;
    }
}
