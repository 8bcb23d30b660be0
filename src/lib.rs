pub mod api;
pub mod config;
pub mod github;
pub mod proxy;

use anyhow::Result;
use config::Config;
use github::TokenMinter;
use proxy::UrlRewriter;

pub struct AppState {
    pub config: Config,
    pub tokens: TokenMinter,
    pub rewriter: UrlRewriter,
    pub proxy_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let tokens = TokenMinter::new(config.github.clone());
        let rewriter = UrlRewriter::new(
            &config.proxy.target_domain,
            &config.proxy.alias_domain,
            &config.proxy.mount,
        )?;
        // Redirects must be observed and rewritten, never silently followed.
        let proxy_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            config,
            tokens,
            rewriter,
            proxy_client,
        })
    }
}
