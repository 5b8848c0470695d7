//! Process settings for a custom handler
//!
//! The Functions host passes everything through environment variables: the port to listen on,
//! and the app settings that binding `connection` references point at.

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use log::LevelFilter;
use thiserror::Error;

/// The port the host expects the handler to listen on.
pub const PORT_VARIABLE: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";
/// Log level for the handler process: `off`, `error`, `warn`, `info`, `debug` or `trace`.
pub const LOG_LEVEL_VARIABLE: &str = "CUSTOM_HANDLER_LOG_LEVEL";
/// Used when the handler runs outside of the Functions host.
pub const DEFAULT_PORT: u16 = 8080;

/// Errors reading handler settings.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    /// The port variable is not a valid port number.
    #[error("FUNCTIONS_CUSTOMHANDLER_PORT='{value}' is not a valid port")]
    InvalidPort {
        /// The value found in the environment
        value: String,
    },
    /// The log level variable is not a known level.
    #[error("CUSTOM_HANDLER_LOG_LEVEL='{value}' is not a log level")]
    InvalidLogLevel {
        /// The value found in the environment
        value: String,
    },
}

/// Settings the handler process runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSettings {
    port: u16,
    log_level: LevelFilter,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: LevelFilter::Info,
        }
    }
}

impl HandlerSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which returns the value of a variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        if let Some(value) = non_blank(lookup(PORT_VARIABLE)) {
            settings.port = value
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidPort { value })?;
        }
        if let Some(value) = non_blank(lookup(LOG_LEVEL_VARIABLE)) {
            settings.log_level = LevelFilter::from_str(value.trim())
                .map_err(|_| SettingsError::InvalidLogLevel { value })?;
        }
        Ok(settings)
    }

    /// Overrides the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The port to listen on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The maximum log level.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// The address to listen on. The host always connects over loopback.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Whether the app setting a binding's `connection` refers to is present in the process
/// environment.
///
/// Both a connection string setting (`name`) and identity based settings
/// (`name__accountEndpoint`) count.
pub fn has_connection(name: &str) -> bool {
    has_connection_in(name, |variable| std::env::var(variable).ok())
}

/// [has_connection] against an arbitrary lookup.
pub fn has_connection_in(name: &str, lookup: impl Fn(&str) -> Option<String>) -> bool {
    [name.to_string(), format!("{name}__accountEndpoint")]
        .iter()
        .any(|variable| non_blank(lookup(variable)).is_some())
}
