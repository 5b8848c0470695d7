#![deny(missing_docs)]

//! Host interface tools for Cosmos DB triggered Azure Functions
//!
//! This crate helps you write Azure Functions in Rust that run as a
//! [custom handler](https://learn.microsoft.com/azure/azure-functions/functions-custom-handlers).
//!
//! The Functions host owns the Cosmos DB change feed: it leases partitions, batches changed
//! documents, and forwards each batch to the handler as an HTTP invocation. This crate describes
//! that exchange: the invocation wire format, the document list a trigger receives, the binding
//! metadata the host reads from `function.json`, and the per-invocation log stream.
//!
//! You are likely to be interested in the sibling crates:
//! * [`cosmosdb-functions`](https://crates.io/crates/cosmosdb-functions): Registration and the custom handler server.
//! * [`cosmosdb-functions-log`](https://crates.io/crates/cosmosdb-functions-log): Standard `log` adapter.

pub mod binding;
mod document;
pub mod encoding;
mod error;
pub mod invocation;
pub mod logging;
pub mod settings;

pub use document::{Document, DocumentList};
pub use error::{Error, FunctionResult};
