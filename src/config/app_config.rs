use std::time::Duration;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub github: GitHubConfig,
    pub cache: CacheConfig,
    pub relay: RelayConfig,
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `github` or `memory`
    pub backend: String,
}

/// Location of the key document in a GitHub repository
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on how stale the validation path may be
    pub cache_duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    /// Sent to a key's owner when the key is used after expiry
    pub expiry_message: String,
    /// Appended to every relayed message after a blank line
    pub message_footer: Option<String>,
    pub parse_mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PanelConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "github".to_string(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            owner: String::new(),
            repo: String::new(),
            path: "keys.json".to_string(),
            branch: None,
            token: None,
            timeout_secs: 10,
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_duration_ms: 60_000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.cache_duration_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            timeout_secs: 10,
            expiry_message: "Your key has been expired. Buy a new key.".to_string(),
            message_footer: None,
            parse_mode: Some("Markdown".to_string()),
        }
    }
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Variable names used by existing deployments
            .set_override_option("github.token", std::env::var("GITHUB_TOKEN").ok())?
            .set_override_option("panel.username", std::env::var("PANEL_USER").ok())?
            .set_override_option("panel.password", std::env::var("PANEL_PASS").ok())?
            .build()?;

        config.try_deserialize()
    }
}
