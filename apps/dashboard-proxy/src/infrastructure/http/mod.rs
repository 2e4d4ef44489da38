//! HTTP Server
//!
//! axum router for the proxy endpoints, the dashboard store and the
//! operational routes.
//!
//! # Endpoints
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /crypto?ids=` | Live prices, cached 30 s |
//! | `GET /crypto/historical?id=&days=` | Price history, cached 5 min |
//! | `GET /news` | Latest headlines, cached 5 min |
//! | `GET /weather/forecast?id=` | Forecast for a place name |
//! | `GET /dashboard` | Store snapshot and stream status |
//! | `GET /dashboard/favorites` | Favorites |
//! | `POST /dashboard/favorites/cities/{city}` | Toggle a favorite city |
//! | `POST /dashboard/favorites/cryptocurrencies/{id}` | Toggle a favorite asset |
//! | `DELETE /dashboard/favorites` | Clear favorites |
//! | `DELETE /dashboard/errors` | Clear slice error messages |
//! | `GET /health`, `/healthz`, `/readyz`, `/metrics` | Operational |

mod error;
mod handlers;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

pub use error::ErrorBody;
pub use handlers::DashboardView;
pub use health::{CacheSizes, HealthResponse, HealthStatus};

use crate::application::services::{DashboardStore, ProxyServices};
use crate::infrastructure::stream::StreamStatus;

/// Header carrying the request id.
const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// State
// =============================================================================

/// Shared state for all routes.
pub struct AppState {
    proxies: Arc<ProxyServices>,
    store: Arc<DashboardStore>,
    stream: Arc<StreamStatus>,
    shutdown: CancellationToken,
    version: String,
    started_at: Instant,
}

impl AppState {
    /// Create the state. `shutdown` flips readiness when cancelled.
    #[must_use]
    pub fn new(
        proxies: Arc<ProxyServices>,
        store: Arc<DashboardStore>,
        stream: Arc<StreamStatus>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            proxies,
            store,
            stream,
            shutdown,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Instant::now(),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build the router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/crypto", get(handlers::crypto))
        .route("/crypto/historical", get(handlers::crypto_historical))
        .route("/news", get(handlers::news))
        .route("/weather/forecast", get(handlers::weather_forecast))
        .route("/dashboard", get(handlers::dashboard))
        .route(
            "/dashboard/favorites",
            get(handlers::favorites).delete(handlers::clear_favorites),
        )
        .route(
            "/dashboard/favorites/cities/{city}",
            post(handlers::toggle_favorite_city),
        )
        .route(
            "/dashboard/favorites/cryptocurrencies/{id}",
            post(handlers::toggle_favorite_cryptocurrency),
        )
        .route("/dashboard/errors", delete(handlers::clear_errors))
        .route("/health", get(health::health))
        .route("/healthz", get(health::liveness))
        .route("/readyz", get(health::readiness))
        .route("/metrics", get(health::metrics))
        .layer(middleware::from_fn(request_span))
        .with_state(state)
}

/// Wrap each request in a span tagged with a request id, echoing the id
/// in the response.
async fn request_span(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server.
pub struct HttpServer {
    port: u16,
    state: Arc<AppState>,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<AppState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::BindFailed` if the port is unavailable.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(self.port, e.to_string()))
    }

    /// Serve on `listener` until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ServerFailed` if the server fails while
    /// running.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let app = create_router(self.state);
        let port = listener.local_addr().map_or(self.port, |addr| addr.port());

        tracing::info!(port, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}
