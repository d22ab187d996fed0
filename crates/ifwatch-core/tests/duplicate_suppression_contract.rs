//! Contract Test: Duplicate Suppression
//!
//! Verifies that repeated identical notifications do not re-trigger the
//! action, and that state seeded from a previous run is honoured.
//!
//! Constraints verified:
//! - Same address twice → exactly one invocation
//! - Duplicate does not overwrite the last address
//! - A spawn failure is not retried and still records the address

mod common;

use common::*;
use ifwatch_core::{Sequencer, SequencerEvent, SequencerState};

#[test]
fn repeated_address_triggers_exactly_once() {
    let (mut sequencer, invoker) = eth0_sequencer();

    feed(
        &mut sequencer,
        &[
            "link:up:eth0",
            "route:add:10.0.0.0:192.168.1.1",
            "ip:add:eth0:192.168.1.50",
            "route:add:10.0.0.0:192.168.1.1",
            "ip:add:eth0:192.168.1.50",
        ],
    );

    assert_eq!(invoker.calls(), vec![ip(192, 168, 1, 50)]);
}

#[test]
fn full_repeated_sequence_is_suppressed() {
    let (mut sequencer, invoker) = eth0_sequencer();
    let first = [
        "link:up:eth0",
        "route:add:10.0.0.0:192.168.1.1",
        "ip:add:eth0:192.168.1.50",
    ];

    feed(&mut sequencer, &first);
    feed(&mut sequencer, &first[..2]);
    let outcome = sequencer.handle_line(first[2]).outcome;

    assert_eq!(
        outcome,
        SequencerEvent::DuplicateSuppressed {
            address: ip(192, 168, 1, 50)
        }
    );
    assert_eq!(invoker.call_count(), 1);
    assert_eq!(sequencer.last_address(), Some(ip(192, 168, 1, 50)));
}

#[test]
fn seeded_last_address_suppresses_after_restart() {
    let invoker = RecordingInvoker::new();
    let mut sequencer = Sequencer::new("eth0", Box::new(invoker.clone()))
        .with_last_address(Some(ip(192, 168, 1, 50)));

    feed(
        &mut sequencer,
        &[
            "link:up:eth0",
            "route:add::192.168.1.1",
            "ip:add:eth0:192.168.1.50",
        ],
    );

    assert_eq!(invoker.call_count(), 0);
    assert_eq!(sequencer.state(), SequencerState::RouteSeen);
}

#[test]
fn spawn_failure_is_reported_and_not_retried() {
    let invoker = FailingInvoker::default();
    let mut sequencer = Sequencer::new("eth0", Box::new(invoker.clone()));

    feed(&mut sequencer, &["link:up:eth0", "route:add::192.168.1.1"]);
    let outcome = sequencer.handle_line("ip:add:eth0:192.168.1.50").outcome;
    assert!(
        matches!(outcome, SequencerEvent::TriggerFailed { address, .. } if address == ip(192, 168, 1, 50)),
        "unexpected outcome {:?}",
        outcome
    );

    // The same address again is now a duplicate, not a retry
    feed(
        &mut sequencer,
        &[
            "link:up:eth0",
            "route:add::192.168.1.1",
            "ip:add:eth0:192.168.1.50",
        ],
    );
    assert_eq!(invoker.attempts(), 1);
}
