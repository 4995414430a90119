//! HTTP server exposing pool statistics as JSON.
//!
//! Every request funnels through a single dispatch handler: the method is
//! checked before the path, so a non-GET request is rejected no matter
//! where it points. Responses built from pre-assembled statistics bytes
//! are passed through verbatim; everything else is serialized from typed
//! structs. Each response carries `Content-Type: application/json` and
//! `Access-Control-Allow-Origin: *` so browser dashboards can poll the
//! API directly.

use std::{
    net::SocketAddr,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    error::{StatsApiError, StatsError},
    route::{Route, RouteError},
    stats::StatsReader,
};

/// Display name advertised by the capability descriptor and health check.
pub const SERVICE_NAME: &str = "Pool Stats API Server";

const ENDPOINTS: [&str; 4] = [
    "/api/status",
    "/api/pool",
    "/api/users",
    "/api/users/{address}",
];

/// Shared state handed to the dispatch handler.
#[derive(Clone)]
struct ServerState {
    reader: StatsReader,
}

/// Handle to the background accept loop of a started server.
struct RunningServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// HTTP server that serves the statistics files under a fixed route table.
///
/// The server is constructed cold. [`StatsApiServer::start`] binds the
/// listener and spawns the accept loop in the background;
/// [`StatsApiServer::stop`] shuts it down gracefully and waits for
/// in-flight connections to drain.
pub struct StatsApiServer {
    bind_address: SocketAddr,
    state: ServerState,
    running: Mutex<Option<RunningServer>>,
}

impl StatsApiServer {
    /// Create a server for the statistics rooted at `stats_dir`.
    pub fn new(bind_address: SocketAddr, stats_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_address,
            state: ServerState {
                reader: StatsReader::new(stats_dir),
            },
            running: Mutex::new(None),
        }
    }

    /// Bind the listener and start serving in a background task.
    ///
    /// Returns the bound address, which differs from the configured one
    /// when port `0` requested an ephemeral port. Starting a server that
    /// is already running fails with [`StatsApiError::AlreadyRunning`]
    /// and leaves the first instance untouched.
    pub async fn start(&self) -> Result<SocketAddr, StatsApiError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            warn!("Stats API server is already running");
            return Err(StatsApiError::AlreadyRunning);
        }

        let listener = TcpListener::bind(self.bind_address).await?;
        let local_addr = listener.local_addr()?;

        let app = Router::new()
            .fallback(dispatch)
            .with_state(self.state.clone());

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone().cancelled_owned();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
            {
                error!("Stats API server error: {e}");
            }
        });

        info!("Stats API server listening on http://{local_addr}");
        for endpoint in ENDPOINTS {
            info!("  GET http://{local_addr}{endpoint}");
        }

        *running = Some(RunningServer {
            local_addr,
            shutdown,
            handle,
        });
        Ok(local_addr)
    }

    /// Stop the server and wait for in-flight connections to drain.
    ///
    /// Stopping a server that is not running is a no-op. A stopped
    /// server can be started again.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        if let Some(server) = running.take() {
            server.shutdown.cancel();
            if let Err(e) = server.handle.await {
                error!("Stats API server task failed: {e}");
            }
            info!("Stats API server stopped");
        }
    }

    /// Address the server is currently bound to, or `None` when stopped.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|s| s.local_addr)
    }
}

#[derive(Serialize)]
struct CapabilityResponse {
    name: &'static str,
    version: &'static str,
    endpoints: [&'static str; 4],
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: u64,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct PathErrorResponse {
    error: &'static str,
    path: String,
}

#[derive(Serialize)]
struct UserErrorResponse {
    error: String,
    address: String,
}

/// Single entry point for every request.
async fn dispatch(State(state): State<ServerState>, request: Request) -> Response {
    let path = request.uri().path();

    let mut response = if request.method() != Method::GET {
        method_not_allowed()
    } else {
        match Route::parse(path) {
            Ok(Route::Capability) => handle_capability(),
            Ok(Route::Health) => handle_health(),
            Ok(Route::PoolStatus) => handle_pool_status(&state).await,
            Ok(Route::AllUsers) => handle_all_users(&state).await,
            Ok(Route::User(address)) => handle_user(&state, address).await,
            Err(RouteError::InvalidUserAddress) => invalid_user_address(),
            Err(RouteError::UnknownPath) => not_found(path),
        }
    };
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

fn handle_capability() -> Response {
    Json(CapabilityResponse {
        name: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS,
    })
    .into_response()
}

fn handle_health() -> Response {
    Json(HealthResponse {
        status: "ok",
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        message: format!("{SERVICE_NAME} is running"),
    })
    .into_response()
}

async fn handle_pool_status(state: &ServerState) -> Response {
    match state.reader.pool_status().await {
        Ok(body) => raw_json(body),
        Err(StatsError::ResponseTooLarge) => buffer_overflow(),
        Err(e) => {
            warn!("Cannot open pool status file: {e}");
            error_json("Cannot open pool status file")
        }
    }
}

async fn handle_all_users(state: &ServerState) -> Response {
    match state.reader.all_users().await {
        Ok(body) => raw_json(body),
        Err(StatsError::ResponseTooLarge) => buffer_overflow(),
        Err(e) => {
            warn!("Cannot open users directory: {e}");
            error_json("Cannot open users directory")
        }
    }
}

async fn handle_user(state: &ServerState, address: String) -> Response {
    match state.reader.user(&address).await {
        Ok(body) => raw_json(body),
        Err(StatsError::UserNotFound { address }) => {
            user_error_json("User not found".to_string(), address)
        }
        Err(StatsError::UserFileTooLarge { address, size }) => {
            user_error_json(format!("User file too large ({size} bytes)"), address)
        }
        Err(e) => {
            warn!("Cannot open user file {address}: {e}");
            user_error_json("Cannot open user file".to_string(), address)
        }
    }
}

/// Pass a pre-assembled JSON body through verbatim.
fn raw_json(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn error_json(message: &str) -> Response {
    Json(ErrorResponse {
        error: message.to_string(),
    })
    .into_response()
}

fn user_error_json(error: String, address: String) -> Response {
    Json(UserErrorResponse { error, address }).into_response()
}

fn buffer_overflow() -> Response {
    error_json("Buffer overflow")
}

fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Only GET method supported".to_string(),
        }),
    )
        .into_response()
}

fn invalid_user_address() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Invalid user address".to_string(),
        }),
    )
        .into_response()
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(PathErrorResponse {
            error: "Not found",
            path: path.to_string(),
        }),
    )
        .into_response()
}
