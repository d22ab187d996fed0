//! Action invocation
//!
//! When the sequencer completes a sequence it hands the new address to an
//! [`ActionInvoker`]. The production implementation starts the configured
//! command through a shell and forgets about it: exit status and output are
//! never collected, and the event loop never waits for it.

use std::net::Ipv4Addr;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Something that can be triggered with a newly acquired address
///
/// Implementations must return promptly; `invoke` is called from the event
/// loop. An `Err` means the action could not be started at all.
pub trait ActionInvoker: Send + Sync {
    /// Start the action for `address`
    fn invoke(&self, address: Ipv4Addr) -> Result<()>;
}

/// Runs `<shell> <command> <address>` as a detached child
///
/// Must be invoked from within a Tokio runtime, which reaps the child once
/// it exits.
#[derive(Debug, Clone)]
pub struct ShellInvoker {
    shell: String,
    command: String,
}

impl ShellInvoker {
    /// Create an invoker running `command` through `/bin/sh`
    pub fn new(command: impl Into<String>) -> Self {
        Self::with_shell("/bin/sh", command)
    }

    /// Create an invoker running `command` through a specific shell
    pub fn with_shell(shell: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            command: command.into(),
        }
    }
}

impl ActionInvoker for ShellInvoker {
    fn invoke(&self, address: Ipv4Addr) -> Result<()> {
        let address = address.to_string();
        info!("Invoking {} {}", self.command, address);

        let child = Command::new(&self.shell)
            .arg(&self.command)
            .arg(&address)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| Error::spawn(format!("{} {}: {}", self.shell, self.command, e)))?;

        // The handle is dropped on purpose: the child keeps running on its own.
        debug!("Spawned action with pid {:?}", child.id());
        Ok(())
    }
}
