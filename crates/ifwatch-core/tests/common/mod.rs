//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles so the sequencer and monitor
//! can be driven with synthetic lines, without a kernel channel or real
//! child processes.

#![allow(dead_code)]

use ifwatch_core::config::MonitorConfig;
use ifwatch_core::error::{Error, Result};
use ifwatch_core::source::{LineSource, LineStream};
use ifwatch_core::{ActionInvoker, Sequencer};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A line source the test can push lines into
pub struct ControlledLineSource {
    /// Receiver for the monitor's stream
    rx: Option<mpsc::UnboundedReceiver<std::io::Result<String>>>,
    /// Call counter for lines()
    lines_call_count: Arc<AtomicUsize>,
}

impl ControlledLineSource {
    /// Create a new controlled source
    ///
    /// Dropping the returned sender ends the stream, like a watcher exiting.
    pub fn new() -> (Self, mpsc::UnboundedSender<std::io::Result<String>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            rx: Some(rx),
            lines_call_count: Arc::new(AtomicUsize::new(0)),
        };
        (source, tx)
    }

    pub fn lines_call_count(&self) -> usize {
        self.lines_call_count.load(Ordering::SeqCst)
    }
}

impl LineSource for ControlledLineSource {
    fn lines(&mut self) -> Result<LineStream> {
        self.lines_call_count.fetch_add(1, Ordering::SeqCst);

        let rx = self
            .rx
            .take()
            .ok_or_else(|| Error::spawn("lines() can only be called once"))?;
        Ok(Box::pin(
            tokio_stream::wrappers::UnboundedReceiverStream::new(rx),
        ))
    }
}

/// A line source that never produces anything (for idle testing)
pub struct IdleLineSource;

impl LineSource for IdleLineSource {
    fn lines(&mut self) -> Result<LineStream> {
        Ok(Box::pin(tokio_stream::pending::<std::io::Result<String>>()))
    }
}

/// An action invoker that records every address it is invoked with
#[derive(Clone, Default)]
pub struct RecordingInvoker {
    calls: Arc<Mutex<Vec<Ipv4Addr>>>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses passed to invoke(), in order
    pub fn calls(&self) -> Vec<Ipv4Addr> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ActionInvoker for RecordingInvoker {
    fn invoke(&self, address: Ipv4Addr) -> Result<()> {
        self.calls.lock().unwrap().push(address);
        Ok(())
    }
}

/// An action invoker whose command can never be started
#[derive(Clone, Default)]
pub struct FailingInvoker {
    attempts: Arc<AtomicUsize>,
}

impl FailingInvoker {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ActionInvoker for FailingInvoker {
    fn invoke(&self, _address: Ipv4Addr) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::spawn("/bin/sh: No such file or directory"))
    }
}

/// A sequencer on `eth0` with a recording invoker
pub fn eth0_sequencer() -> (Sequencer, RecordingInvoker) {
    let invoker = RecordingInvoker::new();
    let sequencer = Sequencer::new("eth0", Box::new(invoker.clone()));
    (sequencer, invoker)
}

/// Helper to create a minimal MonitorConfig for testing
pub fn minimal_config(interface: &str) -> MonitorConfig {
    MonitorConfig::new(interface, "/usr/local/bin/on-new-address")
}

/// Feed lines in order, returning nothing
pub fn feed(sequencer: &mut Sequencer, lines: &[&str]) {
    for line in lines {
        sequencer.handle_line(line);
    }
}

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}
