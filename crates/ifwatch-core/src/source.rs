// # Line Sources
//
// Where the monitor reads protocol lines from.
//
// ## Implementations
//
// - [`WatcherProcess`]: spawns the `ifwatch` decoder and reads its stdout
// - Tests provide in-memory sources fed from a channel
//
// The monitor only ever reads from a source; nothing is written back.

use std::io;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_stream::wrappers::SplitStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use crate::config::WatcherConfig;
use crate::error::{Error, Result};

/// Stream of protocol lines (without trailing newlines)
///
/// An `Err` item is a failure of the underlying reader, not a bad line.
pub type LineStream = Pin<Box<dyn Stream<Item = io::Result<String>> + Send + 'static>>;

/// A producer of protocol lines
///
/// The stream ending means the producer is gone; the monitor treats that as
/// fatal.
pub trait LineSource: Send {
    /// Start producing lines
    ///
    /// Called once per monitor run.
    fn lines(&mut self) -> Result<LineStream>;
}

/// The notification decoder running as a child process
///
/// The child is killed when this value is dropped.
pub struct WatcherProcess {
    config: WatcherConfig,
    child: Option<Child>,
}

impl WatcherProcess {
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }
}

impl LineSource for WatcherProcess {
    fn lines(&mut self) -> Result<LineStream> {
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn(format!("watcher {}: {}", self.config.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::spawn("watcher stdout was not captured"))?;

        info!("Started watcher {} (pid {:?})", self.config.program, child.id());
        self.child = Some(child);

        let lines = SplitStream::new(BufReader::new(stdout).split(b'\n'))
            .map(|chunk| chunk.map(into_line));
        Ok(Box::pin(lines))
    }
}

/// Convert a raw line to text
///
/// Invalid UTF-8 is replaced rather than rejected so that one garbled line
/// cannot end the stream; the codec then rejects it like any other bad line.
fn into_line(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => {
            debug!("Watcher line is not valid UTF-8: {}", e);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
