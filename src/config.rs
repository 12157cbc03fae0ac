use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "postgate.toml";

/// Main configuration structure for Postgate
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgateConfig {
    /// External moderation service settings
    pub moderation: ModerationConfig,
    /// Where posts are kept
    pub storage: StorageConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// API token (falls back to OPENAI_API_KEY, then CHAT_GPT_TOKEN)
    pub api_key: Option<String>,
    /// Chat-completions API root
    pub base_url: String,
    /// Hard limit for one moderation call
    pub timeout_seconds: u64,
    /// Outbound request budget
    pub requests_per_minute: u32,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: crate::moderation::openai::DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            requests_per_minute: 60,
        }
    }
}

impl ModerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit
    Memory,
    /// Locked JSON document
    File,
    /// SQLite database (requires the `database` feature)
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// JSON file path, or SQLite file path / URL
    pub path: String,
    /// SQLite pool size
    pub max_connections: u32,
    /// Run embedded migrations on connect
    pub auto_migrate: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: ".postgate/posts.json".to_string(),
            max_connections: 5,
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (RUST_LOG wins when set)
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl PostgateConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (postgate.toml)
    /// 3. Environment variables (POSTGATE__SECTION__KEY)
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as `load`, but an explicit `path` replaces the default file and
    /// must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("POSTGATE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("failed to read configuration")?;
        let mut postgate_config: PostgateConfig = config
            .try_deserialize()
            .context("invalid configuration")?;

        // The token usually lives outside the config file
        let configured = postgate_config
            .moderation
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !configured {
            postgate_config.moderation.api_key = ["OPENAI_API_KEY", "CHAT_GPT_TOKEN"]
                .into_iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(|key| !key.trim().is_empty());
        }

        Ok(postgate_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<PostgateConfig> = OnceLock::new();

/// Load configuration once per process (called at startup).
///
/// Later calls return the configuration loaded by the first one.
pub fn init_config(path: Option<&Path>) -> Result<&'static PostgateConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    PostgateConfig::load_env_file()?;
    let loaded = PostgateConfig::load_from(path)?;
    Ok(CONFIG.get_or_init(|| loaded))
}

/// Get the global configuration
pub fn config() -> Result<&'static PostgateConfig> {
    CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("configuration has not been initialized"))
}
