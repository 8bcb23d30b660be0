//! Administrative token cache control.

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::AppState;

/// POST /api/github/token/reset - Drop the cached installation token
///
/// The next GitHub-backed request performs a full mint.
pub async fn reset_token_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.tokens.clear_cache();
    info!("Installation token cache cleared");
    StatusCode::NO_CONTENT
}
