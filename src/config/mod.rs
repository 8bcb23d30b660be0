use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public origin the service is reached at (e.g. behind a tunnel or CDN).
    /// Falls back to the request Host header when unset.
    pub external_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            external_url: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// GitHub App ID (the `iss` claim of the app JWT)
    pub app_id: Option<String>,
    /// App private key in PEM format. May contain literal `\n` sequences
    /// when passed through an environment variable.
    pub private_key: Option<String>,
    /// Pre-resolved installation ID. When unset, the installation is looked
    /// up by account login at mint time.
    pub installation_id: Option<i64>,
    /// Account that owns the data repository
    #[serde(default)]
    pub owner: String,
    /// Repository holding the stock JSON files
    #[serde(default)]
    pub repo: String,
    /// Branch to read/write; repository default branch when unset
    pub branch: Option<String>,
    /// Directory inside the repository where stock files live
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            private_key: None,
            installation_id: None,
            owner: String::new(),
            repo: String::new(),
            branch: None,
            data_dir: default_data_dir(),
            api_base: default_api_base(),
        }
    }
}

fn default_data_dir() -> String {
    "stocks".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_target_domain")]
    pub target_domain: String,
    #[serde(default = "default_alias_domain")]
    pub alias_domain: String,
    /// Human-readable site name used in error bodies
    #[serde(default = "default_target_label")]
    pub target_label: String,
    /// Path prefix the proxy is mounted under
    #[serde(default = "default_mount")]
    pub mount: String,
    /// Origin requests are forwarded to. Defaults to
    /// `https://www.<target_domain>`.
    pub upstream_origin: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            target_domain: default_target_domain(),
            alias_domain: default_alias_domain(),
            target_label: default_target_label(),
            mount: default_mount(),
            upstream_origin: None,
        }
    }
}

fn default_target_domain() -> String {
    "facebook.com".to_string()
}

fn default_alias_domain() -> String {
    "fb.com".to_string()
}

fn default_target_label() -> String {
    "Facebook".to_string()
}

fn default_mount() -> String {
    "/api/facebook".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Credentials are commonly injected through the environment rather
    /// than written to the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(app_id) = std::env::var("DESKFOLIO_GITHUB_APP_ID") {
            self.github.app_id = Some(app_id);
        }
        if let Ok(key) = std::env::var("DESKFOLIO_GITHUB_PRIVATE_KEY") {
            self.github.private_key = Some(key);
        }
        if let Ok(id) = std::env::var("DESKFOLIO_GITHUB_INSTALLATION_ID") {
            if let Ok(id) = id.parse() {
                self.github.installation_id = Some(id);
            }
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            github: GitHubConfig::default(),
            proxy: ProxyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
