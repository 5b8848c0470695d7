use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cosmosdb_functions_host::settings::{HandlerSettings, SettingsError, has_connection};
use cosmosdb_functions_log::{LogConfigError, LogMode, configure_logging};
use thiserror::Error;

use crate::metadata::{HostMetadata, MetadataError};
use crate::{FunctionApp, RegistrationError, ServeError, serve};

/// An Azure Functions custom handler serving Cosmos DB change feed triggers
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve invocations from the Functions host (the default)
    Serve {
        /// Overrides FUNCTIONS_CUSTOMHANDLER_PORT
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write host.json and a function.json per registered function
    Metadata {
        /// The function app root
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// The executable host.json starts, relative to the app root. Defaults to this binary's name.
        #[arg(long)]
        executable: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Logging(#[from] LogConfigError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Serve(#[from] ServeError),
    #[error("failed to start the async runtime: {0}")]
    Runtime(std::io::Error),
    #[error("cannot determine the executable name; pass --executable")]
    UnknownExecutable,
}

/// The entry point generated by [crate::cosmos_db_trigger!].
///
/// Reads settings from the environment, installs the invocation logger, registers the app's
/// functions, and runs the requested command.
pub fn run(register: impl FnOnce() -> Result<FunctionApp, RegistrationError>) -> ExitCode {
    match execute(Cli::parse(), register) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            // The logger may be what failed.
            if matches!(e, RunError::Logging(_) | RunError::Settings(_)) {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(
    cli: Cli,
    register: impl FnOnce() -> Result<FunctionApp, RegistrationError>,
) -> Result<(), RunError> {
    let settings = HandlerSettings::from_env()?;
    configure_logging(settings.log_level(), LogMode::Invocation)?;
    let app = register()?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let settings = match port {
                Some(port) => settings.with_port(port),
                None => settings,
            };
            warn_missing_connections(&app);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(RunError::Runtime)?;
            runtime.block_on(serve(app, settings.socket_addr()))?;
        }
        Commands::Metadata {
            out_dir,
            executable,
        } => {
            let executable = match executable {
                Some(executable) => executable,
                None => current_executable().ok_or(RunError::UnknownExecutable)?,
            };
            app.write_metadata(&out_dir, &HostMetadata::for_executable(executable))?;
        }
    }
    Ok(())
}

/// The host resolves connections, so a missing setting is only worth a warning here.
fn warn_missing_connections(app: &FunctionApp) {
    for function in app.functions() {
        let binding = function.binding();
        for connection in [Some(binding.connection()), binding.lease_connection()]
            .into_iter()
            .flatten()
        {
            if !has_connection(connection) {
                log::warn!(
                    "{}: app setting '{connection}' is not set; the host will fail to start this trigger",
                    function.name()
                );
            }
        }
    }
}

fn current_executable() -> Option<String> {
    let path = std::env::current_exe().ok()?;
    path.file_name()?.to_str().map(str::to_string)
}
