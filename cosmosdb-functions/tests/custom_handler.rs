//! End to end tests of the custom handler server over real HTTP.

use cosmosdb_functions::{FunctionApp, ServeError, serve_with_shutdown};
use cosmosdb_functions_host::binding::CosmosDbTrigger;
use cosmosdb_functions_host::invocation::InvocationResponse;
use cosmosdb_functions_host::{DocumentList, Error, FunctionResult};
use cosmosdb_functions_log::{LogMode, configure_logging};
use log::LevelFilter;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

fn binding() -> CosmosDbTrigger {
    CosmosDbTrigger::new(
        "azcosmosdb",
        "container_name",
        "database_name",
        "CosmosDbConnection",
    )
}

fn triggered(_azcosmosdb: DocumentList) {
    log::info!("triggered");
}

fn rejects_deletes(azcosmosdb: DocumentList) -> FunctionResult<()> {
    if azcosmosdb.iter().any(|document| document.get("deleted").is_some()) {
        return Err(Error::message("deletes are not supported"));
    }
    Ok(())
}

fn panics(_azcosmosdb: DocumentList) {
    panic!("handler bug");
}

struct Handler {
    base: String,
    client: reqwest::Client,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<Result<(), ServeError>>,
}

impl Handler {
    async fn start() -> Self {
        configure_logging(LevelFilter::Info, LogMode::Invocation).expect("logger installs");
        let app = FunctionApp::new()
            .cosmos_db_trigger("cosmosdb_trigger", binding(), triggered)
            .and_then(|app| app.cosmos_db_trigger("strict", binding(), rejects_deletes))
            .and_then(|app| app.cosmos_db_trigger("buggy", binding(), panics))
            .expect("functions register");

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, stop) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_with_shutdown(app, listener, async {
            let _ = stop.await;
        }));

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            shutdown,
            server,
        }
    }

    async fn stop(self) -> Result<(), ServeError> {
        self.shutdown.send(()).expect("server is running");
        self.server.await.expect("server task completes")
    }

    async fn invoke(&self, function: &str, body: Value) -> (u16, InvocationResponse) {
        let response = self
            .client
            .post(format!("{}/{function}", self.base))
            .json(&body)
            .send()
            .await
            .expect("request is sent");
        let status = response.status().as_u16();
        (status, response.json().await.expect("response is json"))
    }
}

fn request(documents: Value) -> Value {
    json!({
        "Data": { "azcosmosdb": documents },
        "Metadata": { "sys": { "MethodName": "cosmosdb_trigger", "RandGuid": "3b2a0c52" } }
    })
}

#[tokio::test]
async fn successful_invocation_returns_logs() {
    let handler = Handler::start().await;

    let (status, response) = handler
        .invoke("cosmosdb_trigger", request(json!([{"id": "1"}])))
        .await;

    assert_eq!(status, 200);
    assert_eq!(response.logs.len(), 1, "{:?}", response.logs);
    assert!(response.logs[0].ends_with(" triggered"), "{:?}", response.logs);
    assert_eq!(response.return_value, Value::Null);
}

#[tokio::test]
async fn string_encoded_batches_are_accepted() {
    let handler = Handler::start().await;

    let (status, _) = handler
        .invoke(
            "cosmosdb_trigger",
            request(Value::String(r#"[{"id":"1"},{"id":"2"}]"#.to_string())),
        )
        .await;

    assert_eq!(status, 200);
}

#[tokio::test]
async fn handler_errors_are_surfaced_to_the_host() {
    let handler = Handler::start().await;

    let (status, response) = handler
        .invoke("strict", request(json!([{"id": "1", "deleted": true}])))
        .await;

    assert_eq!(status, 500);
    assert_eq!(
        response.logs.last().map(String::as_str),
        Some("An error occurred during function invocation: deletes are not supported")
    );
}

#[tokio::test]
async fn panics_fail_only_that_invocation() {
    let handler = Handler::start().await;

    let (status, _) = handler.invoke("buggy", request(json!([]))).await;
    assert_eq!(status, 500);

    let (status, _) = handler.invoke("cosmosdb_trigger", request(json!([]))).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn missing_argument_is_a_bad_request() {
    let handler = Handler::start().await;

    let (status, response) = handler
        .invoke("cosmosdb_trigger", json!({"Data": {}, "Metadata": {}}))
        .await;

    assert_eq!(status, 400);
    assert!(
        response.logs[0].contains("argument 'azcosmosdb' is missing"),
        "{:?}",
        response.logs
    );
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let handler = Handler::start().await;

    let response = handler
        .client
        .post(format!("{}/cosmosdb_trigger", handler.base))
        .body("{not json")
        .send()
        .await
        .expect("request is sent");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn unknown_functions_are_not_found() {
    let handler = Handler::start().await;

    let (status, response) = handler.invoke("nope", request(json!([]))).await;

    assert_eq!(status, 404);
    assert_eq!(response.logs, vec!["function 'nope' is not registered"]);
}

#[tokio::test]
async fn batches_larger_than_two_megabytes_are_delivered() {
    let handler = Handler::start().await;
    let large = "x".repeat(1_500_000);

    let (status, response) = handler
        .invoke(
            "cosmosdb_trigger",
            request(json!([{"id": "1", "payload": large}, {"id": "2", "payload": large}])),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(response.logs.len(), 1, "{:?}", response.logs);
}

#[tokio::test]
async fn shutdown_stops_the_server() {
    let handler = Handler::start().await;
    let base = handler.base.clone();
    let (status, _) = handler.invoke("cosmosdb_trigger", request(json!([]))).await;
    assert_eq!(status, 200);

    tokio::time::timeout(std::time::Duration::from_secs(10), handler.stop())
        .await
        .expect("shutdown completes")
        .expect("server exits cleanly");

    assert!(
        reqwest::Client::new()
            .post(format!("{base}/cosmosdb_trigger"))
            .json(&request(json!([])))
            .send()
            .await
            .is_err()
    );
}
