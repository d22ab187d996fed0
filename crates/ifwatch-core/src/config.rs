//! Configuration types for ifwatch
//!
//! This module defines the monitor configuration. The daemon fills it from
//! environment variables, optionally starting from a JSON file.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use crate::codec::MAX_INTERFACE_LEN;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Interface whose link-up starts a sequence (e.g., "eth0")
    pub interface: String,

    /// Command to run with the new address as its only argument
    pub command: String,

    /// Shell used to run the command
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Notification decoder process
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Reset a partially matched sequence after this many seconds
    ///
    /// Unset by default: a sequence stays pending until completed.
    #[serde(default)]
    pub sequence_timeout_secs: Option<u64>,

    /// Address the action already ran for before this start
    ///
    /// A completed sequence with this address is treated as a duplicate.
    #[serde(default)]
    pub last_address: Option<Ipv4Addr>,

    /// Capacity of the sequencer event channel
    ///
    /// When full, new sequencer events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl MonitorConfig {
    /// Create a configuration with defaults for everything but the target
    pub fn new(interface: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            command: command.into(),
            shell: default_shell(),
            watcher: WatcherConfig::default(),
            sequence_timeout_secs: None,
            last_address: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Sequence timeout as a duration, if enabled
    pub fn sequence_timeout(&self) -> Option<Duration> {
        self.sequence_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interface.is_empty() {
            return Err(crate::Error::config("Interface name cannot be empty"));
        }
        // IFNAMSIZ includes the terminating NUL
        if self.interface.len() >= MAX_INTERFACE_LEN {
            return Err(crate::Error::config(format!(
                "Interface name '{}' is too long (max {} bytes)",
                self.interface,
                MAX_INTERFACE_LEN - 1
            )));
        }
        if self.interface.contains(':') || self.interface.contains(char::is_whitespace) {
            return Err(crate::Error::config(format!(
                "Interface name '{}' contains invalid characters",
                self.interface
            )));
        }
        if self.command.is_empty() {
            return Err(crate::Error::config("Command cannot be empty"));
        }
        if self.shell.is_empty() {
            return Err(crate::Error::config("Shell cannot be empty"));
        }
        if self.sequence_timeout_secs == Some(0) {
            return Err(crate::Error::config("Sequence timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.watcher.validate()
    }
}

/// Decoder process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Path of the decoder executable
    #[serde(default = "default_watcher_program")]
    pub program: String,

    /// Extra arguments for the decoder
    #[serde(default)]
    pub args: Vec<String>,
}

impl WatcherConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.program.is_empty() {
            return Err(crate::Error::config("Watcher program cannot be empty"));
        }
        Ok(())
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            program: default_watcher_program(),
            args: Vec::new(),
        }
    }
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_watcher_program() -> String {
    "./ifwatch".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
