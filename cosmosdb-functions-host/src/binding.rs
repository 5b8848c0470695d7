//! Binding metadata for Cosmos DB change feed triggers
//!
//! The Functions host reads a function's bindings from `function.json` when it loads the app.
//! Metadata that does not validate here would fail there, so it is rejected at registration
//! instead of surfacing as a broken trigger.
//!
//! ```rust
//! use cosmosdb_functions_host::binding::{CosmosDbTrigger, FunctionMetadata};
//!
//! let trigger = CosmosDbTrigger::new("azcosmosdb", "container_name", "database_name", "CosmosDbConnection")
//!     .with_lease_container("leases")
//!     .with_create_lease_container_if_not_exists(true);
//! trigger.validate().unwrap();
//!
//! let metadata = FunctionMetadata::new(trigger);
//! assert!(metadata.to_json_pretty().unwrap().contains("\"type\": \"cosmosDBTrigger\""));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Cosmos DB caps database and container ids at this many characters.
const MAX_RESOURCE_NAME_LEN: usize = 255;
/// The smallest provisioned throughput Cosmos DB accepts for a container.
const MIN_CONTAINER_THROUGHPUT: u32 = 400;

/// Which way data flows through a binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Data flows into the function. Triggers are always `in`.
    #[default]
    In,
    /// Data flows out of the function.
    Out,
    /// Both.
    InOut,
}

/// Describes why binding metadata was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum BindingError {
    /// A required property is empty.
    #[error("{property} must not be empty")]
    Missing {
        /// The `function.json` property name
        property: &'static str,
    },
    /// The argument name is not an identifier.
    #[error(
        "name '{name}' must start with a letter or '_' and contain only letters, digits and '_'"
    )]
    InvalidArgumentName {
        /// The rejected name
        name: String,
    },
    /// A database or container name breaks Cosmos DB naming rules.
    #[error("{property} '{value}' is not a valid Cosmos DB resource name: {reason}")]
    InvalidResourceName {
        /// The `function.json` property name
        property: &'static str,
        /// The rejected value
        value: String,
        /// Which rule was broken
        reason: &'static str,
    },
    /// A connection reference cannot name an app setting.
    #[error("{property} '{name}' must name an app setting and cannot contain whitespace")]
    InvalidConnection {
        /// The `function.json` property name
        property: &'static str,
        /// The rejected value
        name: String,
    },
    /// A trigger binding that is not `in`.
    #[error("a trigger binding must have direction 'in'")]
    InvalidDirection,
    /// `maxItemsPerInvocation` of zero would never deliver a document.
    #[error("maxItemsPerInvocation must be greater than zero")]
    ZeroMaxItems,
    /// `leasesContainerThroughput` below the service minimum.
    #[error("leasesContainerThroughput must be at least 400 RU/s, got {0}")]
    ThroughputTooLow(u32),
    /// `startFromTime` is not a timestamp.
    #[error("startFromTime '{value}' is not an RFC 3339 timestamp")]
    InvalidStartTime {
        /// The rejected value
        value: String,
    },
    /// `function.json` could not be parsed at all.
    #[error("malformed function metadata: {message}")]
    Malformed {
        /// The parser's complaint
        message: String,
    },
}

/// A `cosmosDBTrigger` binding: runs a function for each batch of changes on a container.
///
/// Only `name`, `containerName`, `databaseName` and `connection` are required. Every other
/// property is left out of `function.json` unless set, so the extension's defaults apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmosDbTrigger {
    name: String,
    #[serde(default)]
    direction: Direction,
    container_name: String,
    database_name: String,
    connection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lease_container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lease_database_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lease_connection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    create_lease_container_if_not_exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    leases_container_throughput: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lease_container_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feed_poll_delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lease_acquire_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lease_expiration_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lease_renew_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_items_per_invocation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_from_beginning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_from_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferred_locations: Option<String>,
}

impl CosmosDbTrigger {
    /// Creates a trigger binding.
    ///
    /// * `arg_name`: the handler argument the documents are bound to
    /// * `container_name`: the monitored container
    /// * `database_name`: the database holding it
    /// * `connection`: the app setting holding the account's connection information
    pub fn new(
        arg_name: impl Into<String>,
        container_name: impl Into<String>,
        database_name: impl Into<String>,
        connection: impl Into<String>,
    ) -> Self {
        Self {
            name: arg_name.into(),
            direction: Direction::In,
            container_name: container_name.into(),
            database_name: database_name.into(),
            connection: connection.into(),
            lease_container_name: None,
            lease_database_name: None,
            lease_connection: None,
            create_lease_container_if_not_exists: None,
            leases_container_throughput: None,
            lease_container_prefix: None,
            feed_poll_delay: None,
            lease_acquire_interval: None,
            lease_expiration_interval: None,
            lease_renew_interval: None,
            max_items_per_invocation: None,
            start_from_beginning: None,
            start_from_time: None,
            preferred_locations: None,
        }
    }

    /// The argument name the documents are bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The monitored container.
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// The database holding the monitored container.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// The app setting the host reads the connection from.
    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// The app setting for the lease container's account, if it differs.
    pub fn lease_connection(&self) -> Option<&str> {
        self.lease_connection.as_deref()
    }

    /// Container the host checkpoints change feed progress in. Defaults to `leases`.
    pub fn with_lease_container(mut self, name: impl Into<String>) -> Self {
        self.lease_container_name = Some(name.into());
        self
    }

    /// Database of the lease container. Defaults to the monitored database.
    pub fn with_lease_database(mut self, name: impl Into<String>) -> Self {
        self.lease_database_name = Some(name.into());
        self
    }

    /// App setting for the lease container's account. Defaults to `connection`.
    pub fn with_lease_connection(mut self, name: impl Into<String>) -> Self {
        self.lease_connection = Some(name.into());
        self
    }

    /// Lets the host create the lease container on startup.
    pub fn with_create_lease_container_if_not_exists(mut self, create: bool) -> Self {
        self.create_lease_container_if_not_exists = Some(create);
        self
    }

    /// Throughput, in RU/s, for a lease container the host creates.
    pub fn with_leases_container_throughput(mut self, throughput: u32) -> Self {
        self.leases_container_throughput = Some(throughput);
        self
    }

    /// Prefix for lease documents, so several functions can share one lease container.
    pub fn with_lease_container_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lease_container_prefix = Some(prefix.into());
        self
    }

    /// Milliseconds between polls of an idle partition.
    pub fn with_feed_poll_delay(mut self, millis: u64) -> Self {
        self.feed_poll_delay = Some(millis);
        self
    }

    /// Milliseconds between checks for unowned partitions.
    pub fn with_lease_acquire_interval(mut self, millis: u64) -> Self {
        self.lease_acquire_interval = Some(millis);
        self
    }

    /// Milliseconds before an unrenewed lease is considered abandoned.
    pub fn with_lease_expiration_interval(mut self, millis: u64) -> Self {
        self.lease_expiration_interval = Some(millis);
        self
    }

    /// Milliseconds between lease renewals.
    pub fn with_lease_renew_interval(mut self, millis: u64) -> Self {
        self.lease_renew_interval = Some(millis);
        self
    }

    /// Upper bound on the documents delivered per invocation.
    pub fn with_max_items_per_invocation(mut self, max_items: u32) -> Self {
        self.max_items_per_invocation = Some(max_items);
        self
    }

    /// Reads the container's history from the beginning instead of from now, on first start.
    pub fn with_start_from_beginning(mut self, from_beginning: bool) -> Self {
        self.start_from_beginning = Some(from_beginning);
        self
    }

    /// Reads changes starting at an RFC 3339 timestamp, on first start.
    pub fn with_start_from_time(mut self, timestamp: impl Into<String>) -> Self {
        self.start_from_time = Some(timestamp.into());
        self
    }

    /// Comma separated regions to prefer for geo-replicated accounts.
    pub fn with_preferred_locations(mut self, locations: impl Into<String>) -> Self {
        self.preferred_locations = Some(locations.into());
        self
    }

    /// Checks that the host will be able to bind this trigger.
    pub fn validate(&self) -> Result<(), BindingError> {
        validate_argument_name(&self.name)?;
        if self.direction != Direction::In {
            return Err(BindingError::InvalidDirection);
        }
        validate_resource_name("databaseName", &self.database_name)?;
        validate_resource_name("containerName", &self.container_name)?;
        validate_connection("connection", &self.connection)?;

        if let Some(name) = &self.lease_container_name {
            validate_resource_name("leaseContainerName", name)?;
        }
        if let Some(name) = &self.lease_database_name {
            validate_resource_name("leaseDatabaseName", name)?;
        }
        if let Some(name) = &self.lease_connection {
            validate_connection("leaseConnection", name)?;
        }
        if let Some(prefix) = &self.lease_container_prefix {
            if prefix.is_empty() {
                return Err(BindingError::Missing {
                    property: "leaseContainerPrefix",
                });
            }
        }
        if let Some(throughput) = self.leases_container_throughput {
            if throughput < MIN_CONTAINER_THROUGHPUT {
                return Err(BindingError::ThroughputTooLow(throughput));
            }
        }
        if self.max_items_per_invocation == Some(0) {
            return Err(BindingError::ZeroMaxItems);
        }
        if let Some(timestamp) = &self.start_from_time {
            OffsetDateTime::parse(timestamp, &Rfc3339).map_err(|_| {
                BindingError::InvalidStartTime {
                    value: timestamp.clone(),
                }
            })?;
        }
        Ok(())
    }
}

fn validate_argument_name(name: &str) -> Result<(), BindingError> {
    let Some(first) = name.chars().next() else {
        return Err(BindingError::Missing { property: "name" });
    };
    let is_identifier = (first.is_ascii_alphabetic() || first == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !is_identifier {
        return Err(BindingError::InvalidArgumentName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn validate_resource_name(property: &'static str, value: &str) -> Result<(), BindingError> {
    let invalid = |reason| BindingError::InvalidResourceName {
        property,
        value: value.to_string(),
        reason,
    };
    if value.is_empty() {
        return Err(BindingError::Missing { property });
    }
    if value.chars().count() > MAX_RESOURCE_NAME_LEN {
        return Err(invalid("longer than 255 characters"));
    }
    if value.contains(['/', '\\', '#', '?']) {
        return Err(invalid("contains one of '/', '\\', '#' or '?'"));
    }
    if value.ends_with(' ') {
        return Err(invalid("ends with a space"));
    }
    Ok(())
}

fn validate_connection(property: &'static str, name: &str) -> Result<(), BindingError> {
    if name.is_empty() {
        return Err(BindingError::Missing { property });
    }
    if name.chars().any(char::is_whitespace) {
        return Err(BindingError::InvalidConnection {
            property,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// A binding entry in `function.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Binding {
    /// A Cosmos DB change feed trigger.
    #[serde(rename = "cosmosDBTrigger")]
    CosmosDbTrigger(CosmosDbTrigger),
}

impl Binding {
    /// Checks that the host will be able to bind this entry.
    pub fn validate(&self) -> Result<(), BindingError> {
        match self {
            Binding::CosmosDbTrigger(trigger) => trigger.validate(),
        }
    }
}

/// The contents of a function's `function.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// The function's bindings. The first one is its trigger.
    pub bindings: Vec<Binding>,
}

impl FunctionMetadata {
    /// Metadata for a function with a single Cosmos DB trigger.
    pub fn new(trigger: CosmosDbTrigger) -> Self {
        Self {
            bindings: vec![Binding::CosmosDbTrigger(trigger)],
        }
    }

    /// Parses and validates a `function.json` document.
    pub fn parse(json: &str) -> Result<Self, BindingError> {
        let metadata: Self = serde_json::from_str(json).map_err(|e| BindingError::Malformed {
            message: e.to_string(),
        })?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Validates every binding.
    pub fn validate(&self) -> Result<(), BindingError> {
        if self.bindings.is_empty() {
            return Err(BindingError::Missing {
                property: "bindings",
            });
        }
        self.bindings.iter().try_for_each(Binding::validate)
    }

    /// Renders the `function.json` document.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
