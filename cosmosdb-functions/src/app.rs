use std::collections::BTreeMap;

use cosmosdb_functions_host::binding::{BindingError, CosmosDbTrigger, FunctionMetadata};
use cosmosdb_functions_host::encoding::Extract;
use cosmosdb_functions_host::invocation::{InvocationError, InvocationRequest, InvocationResponse};
use thiserror::Error;

use crate::{TriggerResponse, invoke_template};

/// The Functions host limits function names to this many characters.
const MAX_FUNCTION_NAME_LEN: usize = 127;

type Invoker =
    dyn Fn(InvocationRequest) -> Result<InvocationResponse, InvocationError> + Send + Sync;

/// Why a function could not be registered.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("function name '{name}' is invalid: {reason}")]
    InvalidFunctionName { name: String, reason: &'static str },
    #[error("function '{name}' is already registered")]
    Duplicate { name: String },
    #[error("function '{name}' has invalid binding metadata: {source}")]
    Binding {
        name: String,
        #[source]
        source: BindingError,
    },
}

/// A registered trigger function.
pub struct TriggerFunction {
    name: String,
    binding: CosmosDbTrigger,
    invoker: Box<Invoker>,
}

impl TriggerFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> &CosmosDbTrigger {
        &self.binding
    }

    /// The function's `function.json`.
    pub fn metadata(&self) -> FunctionMetadata {
        FunctionMetadata::new(self.binding.clone())
    }

    /// Runs the function for one invocation from the host.
    pub fn invoke(
        &self,
        request: InvocationRequest,
    ) -> Result<InvocationResponse, InvocationError> {
        (self.invoker)(request)
    }
}

impl std::fmt::Debug for TriggerFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerFunction")
            .field("name", &self.name)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

/// The set of functions a custom handler serves.
///
/// ```rust
/// use cosmosdb_functions::FunctionApp;
/// use cosmosdb_functions_host::{DocumentList, binding::CosmosDbTrigger};
///
/// fn cosmosdb_trigger(_documents: DocumentList) {
///     log::info!("triggered");
/// }
///
/// let app = FunctionApp::new()
///     .cosmos_db_trigger(
///         "cosmosdb_trigger",
///         CosmosDbTrigger::new("azcosmosdb", "container_name", "database_name", "CosmosDbConnection"),
///         cosmosdb_trigger,
///     )
///     .unwrap();
/// assert_eq!(app.function_names().collect::<Vec<_>>(), vec!["cosmosdb_trigger"]);
/// ```
#[derive(Debug, Default)]
pub struct FunctionApp {
    functions: BTreeMap<String, TriggerFunction>,
}

impl FunctionApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` to run for every batch of changes the binding describes.
    ///
    /// Invalid names and binding metadata are rejected here, before the host ever sees them.
    pub fn cosmos_db_trigger<TExtract, TResponse, F>(
        mut self,
        name: impl Into<String>,
        binding: CosmosDbTrigger,
        handler: F,
    ) -> Result<Self, RegistrationError>
    where
        TExtract: Extract + 'static,
        TResponse: TriggerResponse + 'static,
        F: Fn(TExtract) -> TResponse + Send + Sync + 'static,
    {
        let name = name.into();
        validate_function_name(&name)?;
        if self.functions.contains_key(&name) {
            return Err(RegistrationError::Duplicate { name });
        }
        if let Err(source) = binding.validate() {
            return Err(RegistrationError::Binding { name, source });
        }

        let invoker_binding = binding.clone();
        let invoker: Box<Invoker> =
            Box::new(move |request| invoke_template(request, &invoker_binding, &handler));
        log::debug!(
            "registered {name}: cosmosDBTrigger on {}/{}",
            binding.database_name(),
            binding.container_name()
        );
        self.functions.insert(
            name.clone(),
            TriggerFunction {
                name,
                binding,
                invoker,
            },
        );
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&TriggerFunction> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &TriggerFunction> {
        self.functions.values()
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Runs the named function, or returns `None` if no such function is registered.
    pub fn invoke(
        &self,
        name: &str,
        request: InvocationRequest,
    ) -> Option<Result<InvocationResponse, InvocationError>> {
        self.get(name).map(|function| function.invoke(request))
    }
}

fn validate_function_name(name: &str) -> Result<(), RegistrationError> {
    let invalid = |reason| RegistrationError::InvalidFunctionName {
        name: name.to_string(),
        reason,
    };
    match name.chars().next() {
        None => Err(invalid("it is empty")),
        Some(first) if !first.is_ascii_alphabetic() => Err(invalid("it must start with a letter")),
        Some(_) if name.len() > MAX_FUNCTION_NAME_LEN => {
            Err(invalid("it is longer than 127 characters"))
        }
        Some(_) if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') => {
            Err(invalid("it may only contain letters, digits, '_' and '-'"))
        }
        Some(_) => Ok(()),
    }
}
