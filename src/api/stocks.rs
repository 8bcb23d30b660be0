//! Stock data endpoints.
//!
//! Stock documents are plain JSON files stored in a GitHub repository and
//! read/written through the Contents API with a minted installation token.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::github::{ContentsClient, ContentsError};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PutStockResponse {
    pub symbol: String,
    pub path: String,
    pub commit: String,
}

/// GET /api/stocks/:symbol - Fetch a stock JSON document
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let symbol = validate_symbol(&symbol)?;
    let github = &state.config.github;

    let token = state.tokens.get_token(&github.owner).await?;
    let client = ContentsClient::new(&github.api_base, token);

    let file = client
        .get_file(
            &github.owner,
            &github.repo,
            &stock_path(&github.data_dir, symbol),
            github.branch.as_deref(),
        )
        .await?;

    let value: serde_json::Value = serde_json::from_str(&file.text)
        .map_err(|e| ApiError::internal(format!("stored stock file is not valid JSON: {}", e)))?;

    Ok(Json(value))
}

/// PUT /api/stocks/:symbol - Create or update a stock JSON document
pub async fn put_stock(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<PutStockResponse>, ApiError> {
    let symbol = validate_symbol(&symbol)?;
    let github = &state.config.github;
    let path = stock_path(&github.data_dir, symbol);

    let token = state.tokens.get_token(&github.owner).await?;
    let client = ContentsClient::new(&github.api_base, token);

    // Updates need the current blob sha; a missing file means create.
    let sha = match client
        .get_file(&github.owner, &github.repo, &path, github.branch.as_deref())
        .await
    {
        Ok(file) => Some(file.sha),
        Err(ContentsError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let content = serde_json::to_string_pretty(&body)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let result = client
        .put_file(
            &github.owner,
            &github.repo,
            &path,
            &format!("Update {} stock data", symbol),
            &content,
            sha.as_deref(),
            github.branch.as_deref(),
        )
        .await?;

    info!(symbol = %symbol, path = %path, commit = %result.commit.sha, "Stored stock file");

    Ok(Json(PutStockResponse {
        symbol: symbol.to_string(),
        path,
        commit: result.commit.sha,
    }))
}

fn stock_path(data_dir: &str, symbol: &str) -> String {
    format!("{}/{}.json", data_dir.trim_end_matches('/'), symbol)
}

/// Symbols become repository file names, so only a conservative character
/// set is allowed through.
fn validate_symbol(symbol: &str) -> Result<&str, ApiError> {
    if symbol.is_empty() || symbol.len() > 16 {
        return Err(ApiError::bad_request("invalid stock symbol"));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ApiError::bad_request("invalid stock symbol"));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_symbols_pass() {
        assert!(validate_symbol("AAPL").is_ok());
        assert!(validate_symbol("BRK.B").is_ok());
        assert!(validate_symbol("btc-usd").is_ok());
    }

    #[test]
    fn path_traversal_is_rejected() {
        assert!(validate_symbol("../secrets").is_err());
        assert!(validate_symbol("a/b").is_err());
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("waytoolongforasymbolname").is_err());
    }

    #[test]
    fn stock_path_joins_cleanly() {
        assert_eq!(stock_path("stocks", "AAPL"), "stocks/AAPL.json");
        assert_eq!(stock_path("data/stocks/", "MSFT"), "data/stocks/MSFT.json");
    }
}
