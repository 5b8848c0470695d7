//! `log` adapter for Cosmos DB triggered Azure Functions
//!
//! This crate adapts [`log`](https://docs.rs/log) to Azure Functions custom handlers. `log` is a
//! standard logging crate, used widely across the ecosystem.
//!
//! With [LogMode::Invocation], records logged while a trigger handler runs are returned to the
//! Functions host with that invocation, so they show up next to the execution in the portal and
//! in Application Insights. Everything else is written to the console.
//!
//! You are likely to be interested in the sibling crates:
//! * [`cosmosdb-functions`](https://crates.io/crates/cosmosdb-functions): Registration and the custom handler server.
//! * [`cosmosdb-functions-host`](https://crates.io/crates/cosmosdb-functions-host): Host interface types.

use log::SetLoggerError;
use thiserror::Error;

mod host_logging;

/// Which logging mode to use?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Attach records to the running invocation's `Logs`; the console otherwise.
    Invocation,
    /// Always write records to the console, with a timestamp.
    Console,
}

#[derive(Debug, Error)]
pub enum LogConfigError {
    #[error("Failed to install host logger: {cause}")]
    Install { cause: SetLoggerError },
    #[error("Logging is already configured in {current:?} mode")]
    ModeConflict { current: LogMode },
}

/// Initializes the logging system with the specified log level and mode.
///
/// Calling this again with the same mode only changes the level. The mode cannot change once
/// a logger is installed.
pub fn configure_logging(level: log::LevelFilter, mode: LogMode) -> Result<(), LogConfigError> {
    host_logging::HostLog::init(level, mode)
}
