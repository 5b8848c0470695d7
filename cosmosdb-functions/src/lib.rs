//! Cosmos DB triggered Azure Functions in Rust
//!
//! This crate turns a plain Rust function into an Azure Functions
//! [custom handler](https://learn.microsoft.com/azure/azure-functions/functions-custom-handlers)
//! triggered by the Cosmos DB change feed.
//!
//! ```rust,no_run
//! use cosmosdb_functions_host::DocumentList;
//!
//! cosmosdb_functions::cosmos_db_trigger!(
//!     cosmosdb_trigger,
//!     arg_name = "azcosmosdb",
//!     container_name = "container_name",
//!     database_name = "database_name",
//!     connection = "CosmosDbConnection",
//! );
//! fn cosmosdb_trigger(_azcosmosdb: DocumentList) {
//!     log::info!("Rust CosmosDB triggered.");
//! }
//! ```
//!
//! The Functions host consumes the change feed, checkpoints it in the lease container, retries
//! failed batches and scales out. The handler only receives batches over HTTP.
//!
//! You are likely to be interested in the sibling crates:
//! * [`cosmosdb-functions-host`](https://crates.io/crates/cosmosdb-functions-host): Host interface types.
//! * [`cosmosdb-functions-log`](https://crates.io/crates/cosmosdb-functions-log): Standard `log` adapter.
mod app;
mod cli;
mod macros;
pub mod metadata;
mod response;
mod server;

pub use app::{FunctionApp, RegistrationError, TriggerFunction};
pub use cli::{RunError, run};
pub use macros::invoke_template;
pub use response::TriggerResponse;
pub use server::{ServeError, router, serve, serve_with_shutdown};

/// Re-exported for use in generated code.
#[doc(hidden)]
pub use cosmosdb_functions_host as host;
