// # ifmonitor - Interface Monitor Daemon
//
// This daemon is a thin integration layer: all sequencing logic lives in
// ifwatch-core. It is responsible for:
// 1. Reading configuration from environment variables (and an optional JSON file)
// 2. Initializing logging and the runtime
// 3. Starting the `ifwatch` decoder as a child process
// 4. Running the monitor until the decoder exits or a signal arrives
//
// When `<interface>` comes up, a route is added and then an address is added,
// `<shell> <command> <address>` is started once per distinct address.
//
// ## Configuration
//
// - `IFMON_CONFIG`: JSON file with a full configuration; the variables below
//   override its values
// - `IFMON_INTERFACE`: Interface to watch (required)
// - `IFMON_COMMAND`: Command to run with the new address (required)
// - `IFMON_SHELL`: Shell used to run the command (default: /bin/sh)
// - `IFMON_WATCHER`: Path of the ifwatch decoder (default: ./ifwatch)
// - `IFMON_SEQUENCE_TIMEOUT_SECS`: Reset unfinished sequences after this long (default: never)
// - `IFMON_LAST_ADDRESS`: Address the command already ran for (default: none)
// - `IFMON_EVENT_CHANNEL_CAPACITY`: Sequencer event channel capacity (default: 1000)
// - `IFMON_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export IFMON_INTERFACE=eth0
// export IFMON_COMMAND=/etc/ifwatch/on-new-address.sh
// export IFMON_WATCHER=/usr/libexec/ifwatch
//
// ifmonitor
// ```

use anyhow::{Context, Result};
use ifwatch_core::{Monitor, MonitorConfig, SequencerEvent, ShellInvoker, WatcherProcess};
use std::env;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (watcher died, read failure)
#[derive(Debug, Clone, Copy)]
enum MonitorExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<MonitorExitCode> for ExitCode {
    fn from(code: MonitorExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    monitor: MonitorConfig,
    log_level: Level,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable lookup
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut monitor = match var("IFMON_CONFIG") {
            Some(path) => MonitorConfig::from_json_file(&path)
                .with_context(|| format!("Failed to load IFMON_CONFIG file {}", path))?,
            None => MonitorConfig::new(
                var("IFMON_INTERFACE").context(
                    "IFMON_INTERFACE is required. Set it via: export IFMON_INTERFACE=eth0",
                )?,
                var("IFMON_COMMAND").context(
                    "IFMON_COMMAND is required. \
                    Set it via: export IFMON_COMMAND=/path/to/on-new-address.sh",
                )?,
            ),
        };

        if let Some(interface) = var("IFMON_INTERFACE") {
            monitor.interface = interface;
        }
        if let Some(command) = var("IFMON_COMMAND") {
            monitor.command = command;
        }
        if let Some(shell) = var("IFMON_SHELL") {
            monitor.shell = shell;
        }
        if let Some(watcher) = var("IFMON_WATCHER") {
            monitor.watcher.program = watcher;
        }
        if let Some(timeout) = var("IFMON_SEQUENCE_TIMEOUT_SECS") {
            monitor.sequence_timeout_secs = Some(timeout.parse().with_context(|| {
                format!("IFMON_SEQUENCE_TIMEOUT_SECS must be a number of seconds. Got: {}", timeout)
            })?);
        }
        if let Some(address) = var("IFMON_LAST_ADDRESS") {
            monitor.last_address = Some(address.parse().with_context(|| {
                format!("IFMON_LAST_ADDRESS must be an IPv4 address. Got: {}", address)
            })?);
        }
        if let Some(capacity) = var("IFMON_EVENT_CHANNEL_CAPACITY") {
            monitor.event_channel_capacity = capacity.parse().with_context(|| {
                format!("IFMON_EVENT_CHANNEL_CAPACITY must be a number. Got: {}", capacity)
            })?;
        }

        monitor.validate()?;

        let log_level = var("IFMON_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "IFMON_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                log_level
            ),
        };

        Ok(Self { monitor, log_level })
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MonitorExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MonitorExitCode::ConfigError.into();
    }

    info!("interface: {}", config.monitor.interface);
    info!("command  : {}", config.monitor.command);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MonitorExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config.monitor)).into()
}

/// Run the daemon
async fn run_daemon(config: MonitorConfig) -> MonitorExitCode {
    let source = WatcherProcess::new(config.watcher.clone());
    let invoker = ShellInvoker::with_shell(config.shell.clone(), config.command.clone());

    let (mut monitor, event_rx) = match Monitor::new(Box::new(source), Box::new(invoker), &config)
    {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to create monitor: {}", e);
            return MonitorExitCode::ConfigError;
        }
    };

    tokio::spawn(log_events(event_rx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // Keep the sender alive: dropping it would stop the monitor.
                error!("Shutdown signals unavailable: {}", e);
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    info!("Monitoring {}", config.interface);
    match monitor.run_with_shutdown(Some(shutdown_rx)).await {
        Ok(()) => {
            info!("Shutting down");
            MonitorExitCode::CleanShutdown
        }
        Err(ifwatch_core::Error::Spawn(e)) => {
            error!("Failed to start watcher: {}", e);
            MonitorExitCode::ConfigError
        }
        Err(e) => {
            error!("Monitor error: {}", e);
            MonitorExitCode::RuntimeError
        }
    }
}

/// Log sequencer outcomes at debug level
async fn log_events(mut event_rx: mpsc::Receiver<SequencerEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!("Sequencer: {:?}", event);
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
