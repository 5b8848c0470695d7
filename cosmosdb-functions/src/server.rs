//! The custom handler HTTP server
//!
//! The Functions host forwards each trigger invocation as `POST /{function_name}` to the port
//! it hands the handler in `FUNCTIONS_CUSTOMHANDLER_PORT`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use cosmosdb_functions_host::invocation::{InvocationError, InvocationRequest, InvocationResponse};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::FunctionApp;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Routes host invocations to the app's functions.
///
/// Request bodies are unlimited: a batch holds up to `maxItemsPerInvocation` documents of up to
/// 2 MB each, and only the host talks to this port.
pub fn router(app: Arc<FunctionApp>) -> Router {
    Router::new()
        .route("/{function_name}", post(invoke))
        .layer(DefaultBodyLimit::disable())
        .with_state(app)
}

/// Serves `app` on `addr` until Ctrl-C.
pub async fn serve(app: FunctionApp, addr: SocketAddr) -> Result<(), ServeError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    serve_with_shutdown(app, listener, shutdown_signal()).await
}

/// Serves `app` on an already bound listener until `shutdown` completes.
pub async fn serve_with_shutdown(
    app: FunctionApp,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError> {
    let addr = listener.local_addr()?;
    log::info!(
        "custom handler listening on {addr} for {}",
        app.function_names().collect::<Vec<_>>().join(", ")
    );
    axum::serve(listener, router(Arc::new(app)))
        .with_graceful_shutdown(shutdown)
        .await?;
    log::info!("custom handler stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown requested"),
        Err(e) => {
            log::error!("cannot listen for shutdown signal, running until killed: {e}");
            std::future::pending::<()>().await;
        }
    }
}

async fn invoke(
    State(app): State<Arc<FunctionApp>>,
    Path(function_name): Path<String>,
    body: Bytes,
) -> Response {
    if app.get(&function_name).is_none() {
        log::warn!("invocation for unknown function '{function_name}'");
        return failure(InvocationError::failed(
            format!("function '{function_name}' is not registered"),
            vec![],
        ))
        .with_status(StatusCode::NOT_FOUND);
    }

    let request: InvocationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("malformed invocation for '{function_name}': {e}");
            return failure(InvocationError::bad_request(
                format!("Failed to parse invocation request: {e}"),
                vec![],
            ))
            .into_response();
        }
    };
    log::debug!(
        "invoking {function_name} ({})",
        request
            .system_metadata()
            .rand_guid()
            .unwrap_or("no invocation id")
    );

    // Handlers are synchronous and log capture is per thread.
    let name = function_name.clone();
    let outcome = tokio::task::spawn_blocking(move || app.invoke(&name, request)).await;
    match outcome {
        Ok(Some(Ok(response))) => (StatusCode::OK, axum::Json(response)).into_response(),
        Ok(Some(Err(error))) => {
            log::warn!("{function_name} failed: {error}");
            failure(error).into_response()
        }
        Ok(None) => failure(InvocationError::failed(
            format!("function '{function_name}' is not registered"),
            vec![],
        ))
        .with_status(StatusCode::NOT_FOUND),
        Err(join_error) => {
            log::error!("{function_name} panicked: {join_error}");
            failure(InvocationError::failed(
                format!("function '{function_name}' panicked"),
                vec![],
            ))
            .into_response()
        }
    }
}

struct Failure {
    status: StatusCode,
    body: InvocationResponse,
}

fn failure(error: InvocationError) -> Failure {
    Failure {
        status: StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body: error.into_response(),
    }
}

impl Failure {
    fn with_status(mut self, status: StatusCode) -> Response {
        self.status = status;
        self.into_response()
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}
