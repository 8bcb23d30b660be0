//! GitHub integration module for GitHub App support.
//!
//! This module provides:
//! - JWT generation and installation token minting (with a single-slot cache)
//! - A Contents API client for reading and writing repository files

pub mod contents;
pub mod token_minter;

pub use contents::{ContentsClient, ContentsError};
pub use token_minter::{generate_app_jwt, GitHubAppError, TokenCache, TokenMinter};
