//! A Cosmos DB change feed trigger.
//!
//! The host runs this binary as the function app's custom handler and forwards each batch of
//! changed documents from `database_name/container_name`. Build it, copy it next to `host.json`,
//! and start the app with `func start`.

use cosmosdb_functions_host::DocumentList;

cosmosdb_functions::cosmos_db_trigger!(
    cosmosdb_trigger,
    arg_name = "azcosmosdb",
    container_name = "container_name",
    database_name = "database_name",
    connection = "CosmosDbConnection",
);

fn cosmosdb_trigger(_azcosmosdb: DocumentList) {
    log::info!("Rust CosmosDB triggered.");
}
