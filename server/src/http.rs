use std::path::Path;

use axum::handler::HandlerWithoutStateExt;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::{get, get_service};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::ws::{ws_handler, AppState};

/// Headers attached to every response, including static files.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("cache-control", "no-store, no-cache, must-revalidate, proxy-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
    ("surrogate-control", "no-store"),
    ("x-powered-by", "PHP 7.4.3"),
];

/// Routes for the game and the browser client under `static_root`:
///
/// - `/ws` game socket
/// - `/` serves `views/index.html`
/// - `/public/*` and `/assets/*` serve those directories
/// - anything else is a plain-text `Not Found`
pub fn router(app_state: AppState, static_root: &Path) -> Router {
    let mut app = Router::new()
        .route("/ws", get(ws_handler))
        .route(
            "/",
            get_service(ServeFile::new(static_root.join("views").join("index.html"))),
        )
        .nest_service(
            "/public",
            ServeDir::new(static_root.join("public")).not_found_service(not_found.into_service()),
        )
        .nest_service(
            "/assets",
            ServeDir::new(static_root.join("assets")).not_found_service(not_found.into_service()),
        )
        .fallback(not_found);

    for &(name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    app.layer(CorsLayer::permissive()).with_state(app_state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
