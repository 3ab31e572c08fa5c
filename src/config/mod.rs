mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, GitHubConfig, LogFormat, LoggingConfig, PanelConfig, RelayConfig,
    ServerConfig, StorageConfig,
};
