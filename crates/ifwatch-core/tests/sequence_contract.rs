//! Contract Test: Sequencing
//!
//! Verifies the link-up → route-add → address-add state machine as seen
//! through protocol lines.
//!
//! Constraints verified:
//! - The full sequence triggers exactly one action with the new address
//! - A second sequence with a different address triggers again
//! - Out-of-order events never move the state (LinkUp and RouteSeen)
//! - Link-up on other interfaces never starts a sequence
//! - Blank and partial lines are ignored

mod common;

use common::*;
use ifwatch_core::{SequencerEvent, SequencerState};

#[test]
fn full_sequence_triggers_once_with_new_address() {
    let (mut sequencer, invoker) = eth0_sequencer();

    feed(
        &mut sequencer,
        &[
            "link:up:eth0",
            "route:add:10.0.0.0:192.168.1.1",
            "ip:add:eth0:192.168.1.50",
        ],
    );

    assert_eq!(invoker.calls(), vec![ip(192, 168, 1, 50)]);
    assert_eq!(sequencer.last_address(), Some(ip(192, 168, 1, 50)));
    assert_eq!(sequencer.state(), SequencerState::Initial);
}

#[test]
fn change_then_change_triggers_twice() {
    let (mut sequencer, invoker) = eth0_sequencer();

    feed(
        &mut sequencer,
        &[
            "link:up:eth0",
            "route:add:10.0.0.0:192.168.1.1",
            "ip:add:eth0:192.168.1.50",
            "link:up:eth0",
            "route:add:10.0.0.0:192.168.1.1",
            "ip:add:eth0:192.168.1.51",
        ],
    );

    assert_eq!(
        invoker.calls(),
        vec![ip(192, 168, 1, 50), ip(192, 168, 1, 51)]
    );
    assert_eq!(sequencer.last_address(), Some(ip(192, 168, 1, 51)));
}

#[test]
fn address_in_initial_state_is_ignored() {
    let (mut sequencer, invoker) = eth0_sequencer();

    let outcome = sequencer.handle_line("ip:add:eth0:192.168.1.50").outcome;

    assert_eq!(outcome, SequencerEvent::Ignored);
    assert_eq!(sequencer.state(), SequencerState::Initial);
    assert_eq!(invoker.call_count(), 0);
}

#[test]
fn out_of_order_events_do_not_regress_state() {
    let (mut sequencer, _invoker) = eth0_sequencer();

    feed(&mut sequencer, &["link:up:eth0", "route:add::192.168.1.1"]);
    assert_eq!(sequencer.state(), SequencerState::RouteSeen);

    // None of these match the RouteSeen transition
    feed(
        &mut sequencer,
        &[
            "link:up:eth0",
            "link:down:eth0",
            "route:add::192.168.1.1",
            "route:del::192.168.1.1",
            "ip:del:eth0:192.168.1.50",
        ],
    );
    assert_eq!(sequencer.state(), SequencerState::RouteSeen);
}

#[test]
fn unexpected_events_in_link_up_keep_link_up() {
    let (mut sequencer, invoker) = eth0_sequencer();

    sequencer.handle_line("link:up:eth0");
    assert_eq!(sequencer.state(), SequencerState::LinkUp);

    // Only a route add moves LinkUp forward
    for line in [
        "ip:add:eth0:192.168.1.50",
        "route:del:10.0.0.0:192.168.1.1",
        "ip:del:eth0:192.168.1.50",
        "link:down:eth0",
        "link:up:eth0",
    ] {
        assert_eq!(
            sequencer.handle_line(line).outcome,
            SequencerEvent::Ignored,
            "line {:?}",
            line
        );
        assert_eq!(sequencer.state(), SequencerState::LinkUp);
    }

    assert_eq!(invoker.call_count(), 0);
}

#[test]
fn link_up_on_other_interface_never_leaves_initial() {
    let (mut sequencer, invoker) = eth0_sequencer();

    feed(
        &mut sequencer,
        &[
            "link:up:wlan0",
            "route:add:10.0.0.0:192.168.1.1",
            "ip:add:wlan0:192.168.1.50",
            "link:up:eth00",
            "link:up:eth",
        ],
    );

    assert_eq!(sequencer.state(), SequencerState::Initial);
    assert_eq!(invoker.call_count(), 0);
}

#[test]
fn malformed_lines_are_ignored_without_state_change() {
    let (mut sequencer, invoker) = eth0_sequencer();

    for line in ["", "\n", "link", "link:up", "ip:add:eth0:not-an-ip", "bogus:thing"] {
        assert_eq!(sequencer.handle_line(line).outcome, SequencerEvent::Ignored, "line {:?}", line);
        assert_eq!(sequencer.state(), SequencerState::Initial);
    }

    sequencer.handle_line("link:up:eth0");
    for line in ["", "route", "route:add", "ip:add:eth0:999.1.1.1"] {
        assert_eq!(sequencer.handle_line(line).outcome, SequencerEvent::Ignored, "line {:?}", line);
        assert_eq!(sequencer.state(), SequencerState::LinkUp);
    }

    assert_eq!(invoker.call_count(), 0);
}

#[test]
fn any_route_add_advances_regardless_of_values() {
    let (mut sequencer, _invoker) = eth0_sequencer();

    sequencer.handle_line("link:up:eth0");
    let outcome = sequencer.handle_line("route:add::").outcome;

    assert_eq!(
        outcome,
        SequencerEvent::Advanced {
            from: SequencerState::LinkUp,
            to: SequencerState::RouteSeen
        }
    );
}

#[test]
fn stale_partial_sequence_is_completed_by_unrelated_events() {
    // Without a timeout a pending sequence waits forever, so a much later
    // unrelated route/address change completes it.
    let (mut sequencer, invoker) = eth0_sequencer();

    feed(
        &mut sequencer,
        &[
            "link:up:eth0",
            "route:add:172.16.0.0:",
            "ip:add:docker0:172.17.0.1",
        ],
    );

    assert_eq!(invoker.calls(), vec![ip(172, 17, 0, 1)]);
}
