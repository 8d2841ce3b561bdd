//! GameDock HTTP surface.
//!
//! Builds the axum router (health, upload, game listing), wires CORS and the
//! body-size limit from configuration, and serves it with graceful shutdown
//! on SIGINT/SIGTERM.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP specifics (multipart parsing, status codes,
//! headers) live here; handlers immediately hand off to the `bundle` and
//! `publisher` crates through [`state::AppState`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | Environment-backed [`config::Config`] |
//! | [`error`] | [`error::ApiError`] and its JSON response mapping |
//! | [`state`] | [`state::AppState`] dependency bundle |
//! | [`auth`] | Bearer-token [`auth::AuthUser`] extractor |
//! | [`routes`] | The three request handlers |

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use state::AppState;

use routes::{games_handler, health_handler, upload_handler};

/// Assembles the application router.
pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/upload", post(upload_handler))
        .route("/api/games", get(games_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

/// Binds the configured port and serves until a shutdown signal arrives.
pub async fn serve(config: &Config, state: AppState) -> std::io::Result<()> {
    let app = router(state, config);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let interrupt = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
