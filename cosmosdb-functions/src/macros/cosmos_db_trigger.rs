use cosmosdb_functions_host::binding::CosmosDbTrigger;
use cosmosdb_functions_host::encoding::Extract;
use cosmosdb_functions_host::invocation::{InvocationError, InvocationRequest, InvocationResponse};
use cosmosdb_functions_host::{Error, logging};

use crate::TriggerResponse;

/// Register a Cosmos DB change feed trigger and generate the handler's `main`.
///
/// The function is registered under the handler's name, which is also the folder the host
/// expects its `function.json` in. The generated binary serves invocations by default and writes
/// its metadata with `metadata --out-dir <dir>`.
///
/// The handler can accept a [cosmosdb_functions_host::DocumentList], `Vec<serde_json::Value>`,
/// `serde_json::Value`, or [cosmosdb_functions_host::encoding::Json] of your own type, and
/// return anything implementing [crate::TriggerResponse].
///
/// **Binding properties:**
/// ```rust,no_run
/// use cosmosdb_functions_host::DocumentList;
///
/// cosmosdb_functions::cosmos_db_trigger!(
///     cosmosdb_trigger,
///     arg_name = "azcosmosdb",
///     container_name = "container_name",
///     database_name = "database_name",
///     connection = "CosmosDbConnection",
/// );
/// fn cosmosdb_trigger(azcosmosdb: DocumentList) {
///     log::info!("{} documents changed", azcosmosdb.len());
/// }
/// ```
///
/// **Full binding:**
/// ```rust,no_run
/// use cosmosdb_functions_host::{FunctionResult, binding::CosmosDbTrigger, encoding::Json};
///
/// #[derive(serde::Deserialize)]
/// struct Order {
///     id: String,
/// }
///
/// cosmosdb_functions::cosmos_db_trigger!(
///     orders_changed,
///     CosmosDbTrigger::new("orders", "orders", "shop", "CosmosDbConnection")
///         .with_lease_container("leases")
///         .with_create_lease_container_if_not_exists(true)
///         .with_max_items_per_invocation(100),
/// );
/// fn orders_changed(Json(orders): Json<Vec<Order>>) -> FunctionResult<()> {
///     for order in orders {
///         log::info!("order {} changed", order.id);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! cosmos_db_trigger {
    (
        $handler: ident,
        arg_name = $arg_name: expr,
        container_name = $container_name: expr,
        database_name = $database_name: expr,
        connection = $connection: expr $(,)?
    ) => {
        $crate::cosmos_db_trigger!(
            $handler,
            $crate::host::binding::CosmosDbTrigger::new(
                $arg_name,
                $container_name,
                $database_name,
                $connection,
            )
        );
    };

    ($handler: ident, $binding: expr $(,)?) => {
        fn function_app() -> ::std::result::Result<$crate::FunctionApp, $crate::RegistrationError> {
            $crate::FunctionApp::new().cosmos_db_trigger(::std::stringify!($handler), $binding, $handler)
        }

        fn main() -> ::std::process::ExitCode {
            $crate::run(function_app)
        }
    };
}

/// An internal helper for the cosmos_db_trigger! macro and [crate::FunctionApp].
///
/// Extracts the trigger argument, runs the handler while capturing its logs, and packages the
/// outcome for the host. A payload that cannot be extracted never reaches the handler.
#[doc(hidden)]
pub fn invoke_template<TExtract, TResponse, F>(
    mut request: InvocationRequest,
    binding: &CosmosDbTrigger,
    handler: &F,
) -> Result<InvocationResponse, InvocationError>
where
    TExtract: Extract,
    TResponse: TriggerResponse,
    F: Fn(TExtract) -> TResponse,
{
    let argument = binding.name();
    let input = request
        .take_argument(argument)
        .ok_or_else(|| Error::ExtractError(format!("argument '{argument}' is missing")))
        .and_then(TExtract::extract);
    let input = match input {
        Ok(input) => input,
        Err(error) => {
            return Err(InvocationError::bad_request(
                format!("Failed to parse invocation for '{argument}': {error}"),
                vec![],
            ));
        }
    };

    let (result, logs) = logging::capture(|| handler(input).into_return_value());
    match result {
        Ok(return_value) => Ok(InvocationResponse::new()
            .with_logs(logs)
            .with_return_value(return_value)),
        Err(error) => Err(InvocationError::failed(
            format!("An error occurred during function invocation: {error}"),
            logs,
        )),
    }
}

#[cfg(test)]
mod tests {
    use cosmosdb_functions_host::DocumentList;
    use cosmosdb_functions_host::FunctionResult;
    use serde_json::{Value, json};

    use super::*;

    fn binding() -> CosmosDbTrigger {
        CosmosDbTrigger::new("docs", "c", "d", "Conn")
    }

    fn count(documents: DocumentList) -> Value {
        cosmosdb_functions_host::logging::log("counted", log::Level::Info);
        json!(documents.len())
    }

    fn fail(_documents: DocumentList) -> FunctionResult<()> {
        cosmosdb_functions_host::logging::log("about to fail", log::Level::Info);
        Err(Error::message("database unreachable"))
    }

    #[test]
    fn returns_value_and_captured_logs() {
        let request = InvocationRequest::with_argument("docs", json!([{"id": "1"}, {"id": "2"}]));
        let response = invoke_template(request, &binding(), &count).unwrap();
        assert_eq!(response.return_value, json!(2));
        assert_eq!(response.logs, vec!["counted"]);
    }

    #[test]
    fn missing_argument_is_a_bad_request() {
        let request = InvocationRequest::with_argument("other", json!([]));
        let error = invoke_template(request, &binding(), &count).unwrap_err();
        assert_eq!(error.status(), 400);
        assert!(error.to_string().contains("argument 'docs' is missing"), "{error}");
    }

    #[test]
    fn undecodable_argument_is_a_bad_request() {
        let request = InvocationRequest::with_argument("docs", json!({"id": "1"}));
        let error = invoke_template(request, &binding(), &count).unwrap_err();
        assert_eq!(error.status(), 400);
    }

    #[test]
    fn handler_errors_fail_the_invocation_with_logs() {
        let request = InvocationRequest::with_argument("docs", json!([]));
        let error = invoke_template(request, &binding(), &fail).unwrap_err();
        assert_eq!(error.status(), 500);
        assert_eq!(
            error.into_response().logs,
            vec![
                "about to fail",
                "An error occurred during function invocation: database unreachable"
            ]
        );
    }
}
