// # ifwatch - Notification Decoder
//
// Subscribes to rtnetlink IPv4 address, IPv4 route and link notifications
// and prints one protocol line per decoded event on stdout:
//
// ```text
// link:up:eth0
// route:add:10.0.0.0:192.168.1.1
// ip:add:eth0:192.168.1.50
// ```
//
// stdout carries nothing but protocol lines; diagnostics go to stderr.
// Every line is flushed as soon as it is written.
//
// ## Configuration
//
// - `IFWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Exit codes
//
// - 1: the channel could not be opened (usually missing privileges)
// - 2: the channel failed or stdout was closed

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum WatchExitCode {
    /// Configuration error or startup failure
    StartupError = 1,
    /// Runtime error (channel failure, reader gone)
    RuntimeError = 2,
}

impl From<WatchExitCode> for ExitCode {
    fn from(code: WatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "IFWATCH_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}

fn main() -> ExitCode {
    let log_level = env::var("IFWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_level = match parse_log_level(&log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WatchExitCode::StartupError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WatchExitCode::StartupError.into();
    }

    run()
}

#[cfg(target_os = "linux")]
fn run() -> ExitCode {
    use ifwatch_core::encode;
    use ifwatch_netlink::Watcher;
    use std::io::Write;
    use tracing::info;

    let mut watcher = match Watcher::open() {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("{}", e);
            return WatchExitCode::StartupError.into();
        }
    };
    info!("Watching for address, link and route changes");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = watcher.run(|event| {
        writeln!(out, "{}", encode(event))?;
        out.flush()
    });

    // run() only returns on failure
    if let Err(e) = result {
        error!("Watch loop stopped: {}", e);
    }
    WatchExitCode::RuntimeError.into()
}

#[cfg(not(target_os = "linux"))]
fn run() -> ExitCode {
    error!("ifwatch needs rtnetlink and only runs on Linux");
    WatchExitCode::StartupError.into()
}
