//! HTTP server wiring for Lexicard (lesson API, static files, shared state).

/// Background-thread server helper for tests and embedding.
pub mod embedded;
/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for lesson endpoints.
pub mod handlers;

pub use embedded::EmbeddedServer;
pub use lexicard_core::{config, models, naming, AppError, Config, FileStore, DEFAULT_PORT};

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    routing::{get, post},
    Router,
};
use hyper::header::HeaderValue;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `store`: Open lesson store.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn new(config: Config, store: FileStore) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Open the store at `config.data_dir` and build state around it.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn open(config: Config) -> Result<Self, AppError> {
        let store = FileStore::open(&config.data_dir)?;
        Ok(Self::new(config, store))
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let methods = [axum::http::Method::GET, axum::http::Method::POST];
    let cors = if allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin(
                ["localhost", "127.0.0.1"]
                    .into_iter()
                    .filter_map(|host| {
                        HeaderValue::from_str(&format!("http://{}:{}", host, cors_port)).ok()
                    })
                    .collect::<Vec<_>>(),
            )
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    };

    let mut router = Router::new()
        .route("/api/files", get(handlers::lessons::list_files))
        .route("/api/data/:name", get(handlers::lessons::read_file))
        .route("/api/save/:name", post(handlers::lessons::save_file))
        .route("/api/health", get(handlers::health))
        // Read-only copy of the lessons for clients without API access
        .nest_service("/data", ServeDir::new(state.store.root()));

    if let Some(static_dir) = state.config.static_dir.as_deref() {
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    router
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(state.config.max_body_size))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
