// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{page, sanitizer},
    state::AppState,
};

/// Headroom over `max_page_size` so oversized pages reach the handler and
/// get a proper 413 instead of being cut off mid-body. The limit counts
/// characters; a four-byte character percent-encodes to twelve bytes.
const FORM_OVERHEAD_FACTOR: usize = 12;
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Assembles the main application router.
///
/// * `/api/page` publishes, `/p/{id}` serves, `/api/config` describes the whitelist.
/// * Applies global middleware (Trace, CORS, body limit).
/// * Every response allows any origin; published pages are meant to be embedded.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let body_limit = state
        .config
        .max_page_size
        .saturating_mul(FORM_OVERHEAD_FACTOR)
        .saturating_add(FORM_OVERHEAD_BYTES);

    let api_routes = Router::new()
        .route("/page", post(page::publish_page))
        .route("/config", get(sanitizer::get_sanitizer_config));

    let page_routes = Router::new().route("/{id}", get(page::get_page));

    Router::new()
        .nest("/api", api_routes)
        .nest("/p", page_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
