// # ifwatch-core
//
// Core library for the interface watcher.
//
// ## Architecture Overview
//
// The system is split into two cooperating processes glued together by a
// line-oriented text protocol:
//
// ```text
// kernel ──▶ ifwatch (decoder) ──▶ "link:up:eth0\n" ──▶ ifmonitor (sequencer) ──▶ command
// ```
//
// This library holds everything that is not tied to the kernel channel:
// - **Event**: typed address/link/route change events
// - **codec**: the colon-delimited line protocol (`encode` / `decode`)
// - **Sequencer**: link-up → route-add → address-add state machine
// - **ActionInvoker**: fire-and-forget execution of the configured command
// - **LineSource**: where protocol lines come from (usually the decoder process)
// - **Monitor**: the event loop tying a line source to the sequencer
//
// ## Design Principles
//
// 1. **Two processes, one contract**: the line codec is the only thing the
//    decoder and the sequencer share.
// 2. **Explicit state**: sequencer state lives in a value, never in globals.
// 3. **Fail fast on infrastructure, degrade on data**: a dead watcher stops
//    the monitor, a garbled line does not.

pub mod action;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod monitor;
pub mod sequencer;
pub mod source;

// Re-export core types for convenience
pub use action::{ActionInvoker, ShellInvoker};
pub use codec::{LineError, decode, encode};
pub use config::{MonitorConfig, WatcherConfig};
pub use error::{Error, Result};
pub use event::{AddressEvent, AddressOp, Event, LinkEvent, LinkState, RouteEvent, RouteOp};
pub use monitor::Monitor;
pub use sequencer::{Sequencer, SequencerEvent, SequencerState, Step};
pub use source::{LineSource, LineStream, WatcherProcess};
