//! HTTP server wiring for the pastebin (routes, identity, shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for pastes, accounts, API keys and admin.
pub mod handlers;
/// Request identity from API keys and session cookies.
pub mod identity;
/// Background expiry sweeps.
pub mod sweeper;

pub use pastebin_core::{
    config, db, models, AppError, Clock, Config, Database, ManualClock, Services, SystemClock,
};
pub use sweeper::{ExpirySweeper, SweepReport};

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use hyper::HeaderMap;
use std::future::Future;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared state on the wall clock.
    pub fn new(config: Config, db: Database) -> Self {
        Self::with_clock(config, Arc::new(db), Arc::new(SystemClock))
    }

    /// Construct shared state over an existing handle and an injected clock.
    pub fn with_clock(config: Config, db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self {
            services: Services::new(db.clone(), clock),
            db,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// Pastes are served at `{serve_path}:id`.
///
/// # Panics
/// Panics if static header values fail to parse (should not happen).
pub fn create_app(state: AppState) -> Router {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(header::X_CONTENT_TYPE_OPTIONS, "nosniff".parse().unwrap());
    default_headers.insert(header::X_FRAME_OPTIONS, "DENY".parse().unwrap());
    default_headers.insert(
        header::CONTENT_SECURITY_POLICY,
        "default-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'"
            .parse()
            .unwrap(),
    );

    let serve_route = format!("{}:id", state.config.serve_path);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/livez", get(handlers::health::livez))
        .route("/readyz", get(handlers::health::readyz))
        // Accounts
        .route("/api/register", post(handlers::account::register))
        .route("/api/login", post(handlers::account::login))
        .route("/api/logout", post(handlers::account::logout))
        .route("/api/me", get(handlers::account::me))
        // Pastes
        .route("/upload", post(handlers::paste::upload))
        .route(&serve_route, get(handlers::paste::view))
        .route(
            "/api/paste/update/:id",
            put(handlers::paste::update).post(handlers::paste::update),
        )
        .route(
            "/api/paste/delete/:id",
            delete(handlers::paste::delete).post(handlers::paste::delete),
        )
        .route("/api/paste/search", get(handlers::paste::search))
        .route("/my-pastes", get(handlers::paste::my_pastes))
        .route("/all", get(handlers::paste::all_pastes))
        // API keys
        .route("/api/keys", get(handlers::api_key::list_keys))
        .route("/api/keys/create", post(handlers::api_key::create_key))
        .route(
            "/api/keys/delete",
            post(handlers::api_key::delete_key).delete(handlers::api_key::delete_key),
        )
        // Admin
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/:id/stats",
            get(handlers::admin::user_stats),
        )
        .route(
            "/api/admin/delete-user",
            post(handlers::admin::delete_user).delete(handlers::admin::delete_user),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity::identity_middleware,
        ))
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(state.config.max_body_size))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    default_headers
                        .get(header::CONTENT_SECURITY_POLICY)
                        .unwrap()
                        .clone(),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    default_headers
                        .get(header::X_CONTENT_TYPE_OPTIONS)
                        .unwrap()
                        .clone(),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    default_headers
                        .get(header::X_FRAME_OPTIONS)
                        .unwrap()
                        .clone(),
                )),
        )
}

/// Resolve the configured bind string (`host:port`) to a socket address.
///
/// # Errors
/// Returns [`AppError::Config`] when the address does not resolve.
pub fn resolve_bind_address(config: &Config) -> Result<SocketAddr, AppError> {
    config
        .bind
        .trim()
        .to_socket_addrs()
        .map_err(|err| AppError::Config(format!("Invalid bind address '{}': {}", config.bind, err)))?
        .next()
        .ok_or_else(|| {
            AppError::Config(format!("Bind address '{}' resolved to nothing", config.bind))
        })
}

/// Run the Axum server with graceful shutdown support.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
