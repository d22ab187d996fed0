//! Monitor event loop
//!
//! The Monitor is responsible for:
//! - Reading protocol lines from a [`LineSource`]
//! - Decoding them and feeding the [`Sequencer`]
//! - Publishing sequencer outcomes for observation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ LineSource  │─── "ip:add:eth0:192.168.1.50" ───┐
//! └─────────────┘                                   │
//!                                                   ▼
//!                                          ┌──────────────┐
//!                                          │  Sequencer   │──▶ ActionInvoker
//!                                          └──────────────┘
//!                                                   │
//!                                                   ▼
//!                                          SequencerEvent channel
//! ```
//!
//! ## Termination
//!
//! - The line stream ending or failing is fatal (`Err`)
//! - A shutdown signal ends the loop cleanly (`Ok`)

use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::action::ActionInvoker;
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::sequencer::{Sequencer, SequencerEvent};
use crate::source::LineSource;

/// Drives a [`Sequencer`] from a [`LineSource`]
///
/// Runs on a single task: the sequencer state is owned by the loop and never
/// shared.
pub struct Monitor {
    /// Where protocol lines come from
    source: Box<dyn LineSource>,

    /// State machine fed with every decoded event
    sequencer: Sequencer,

    /// Sender for sequencer outcomes
    event_tx: mpsc::Sender<SequencerEvent>,
}

impl Monitor {
    /// Create a new monitor
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields every
    /// non-ignored sequencer outcome
    pub fn new(
        source: Box<dyn LineSource>,
        invoker: Box<dyn ActionInvoker>,
        config: &MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<SequencerEvent>)> {
        config.validate()?;

        let sequencer = Sequencer::new(config.interface.clone(), invoker)
            .with_timeout(config.sequence_timeout())
            .with_last_address(config.last_address);

        Ok(Self::with_sequencer(
            source,
            sequencer,
            config.event_channel_capacity,
        ))
    }

    /// Create a monitor around an already configured sequencer
    pub fn with_sequencer(
        source: Box<dyn LineSource>,
        sequencer: Sequencer,
        event_channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<SequencerEvent>) {
        let (tx, rx) = mpsc::channel(event_channel_capacity.max(1));
        let monitor = Self {
            source,
            sequencer,
            event_tx: tx,
        };
        (monitor, rx)
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Run until the line source ends or SIGINT is received
    pub async fn run(&mut self) -> Result<()> {
        self.run_with_shutdown(None).await
    }

    /// Run until the line source ends or `shutdown_rx` fires
    ///
    /// With `None`, ctrl-c is the shutdown signal. A dropped sender counts
    /// as a shutdown signal too.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        let mut lines = self.source.lines()?;
        info!("Waiting for link up on {}", self.sequencer.interface());

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to wait for ctrl-c: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                next = lines.next() => match next {
                    Some(Ok(line)) => self.handle_line(&line),
                    Some(Err(e)) => {
                        error!("Failed to read from watcher: {}", e);
                        return Err(e.into());
                    }
                    None => {
                        error!("Watcher closed its output");
                        return Err(Error::watcher_exited("end of line stream"));
                    }
                },

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Feed one line to the sequencer and publish what it did
    fn handle_line(&mut self, line: &str) {
        debug!("Received line {:?}", line);

        for event in self.sequencer.handle_line(line).events() {
            self.emit_event(event);
        }
    }

    /// Publish a sequencer outcome, dropping it if the channel is full
    fn emit_event(&self, event: SequencerEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping sequencer event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LineStream;
    use std::net::Ipv4Addr;

    struct FixedLines(Vec<&'static str>);

    impl LineSource for FixedLines {
        fn lines(&mut self) -> Result<LineStream> {
            let lines: Vec<std::io::Result<String>> =
                self.0.iter().map(|l| Ok(l.to_string())).collect();
            Ok(Box::pin(tokio_stream::iter(lines)))
        }
    }

    struct NoAction;

    impl ActionInvoker for NoAction {
        fn invoke(&self, _address: Ipv4Addr) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_end_of_stream_is_fatal_after_processing() {
        let source = FixedLines(vec![
            "link:up:eth0",
            "",
            "route:add:10.0.0.0:192.168.1.1",
            "ip:add:eth0:192.168.1.50",
        ]);
        let config = MonitorConfig::new("eth0", "true");
        let (mut monitor, mut rx) =
            Monitor::new(Box::new(source), Box::new(NoAction), &config).unwrap();

        let result = monitor.run().await;
        assert!(matches!(result, Err(Error::WatcherExited(_))));
        assert_eq!(
            monitor.sequencer().last_address(),
            Some(Ipv4Addr::new(192, 168, 1, 50))
        );

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2],
            SequencerEvent::Triggered {
                address: Ipv4Addr::new(192, 168, 1, 50)
            }
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MonitorConfig::new("", "true");
        let result = Monitor::new(
            Box::new(FixedLines(Vec::new())),
            Box::new(NoAction),
            &config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
