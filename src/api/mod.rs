pub mod error;
mod stocks;
mod tokens;

use axum::{
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::proxy;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // The proxy sets its own CORS headers; the layer covers the JSON API.
    let api_routes = Router::new()
        .route(
            "/api/stocks/:symbol",
            get(stocks::get_stock).put(stocks::put_stock),
        )
        .route("/api/github/token/reset", post(tokens::reset_token_cache))
        .layer(CorsLayer::permissive());

    let mount = state.config.proxy.mount.clone();
    let proxy_routes = Router::new()
        .route(&mount, any(proxy::proxy_request))
        .route(&format!("{}/*path", mount), any(proxy::proxy_request));

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .merge(proxy_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
