//! Client settings
//!
//! These are the knobs the resolver configuration document does not carry:
//! HTTP timeouts and retries, the user agent, and where to find the resolver
//! configuration itself. Loaded from:
//! - Default values
//! - Config file (iglu.toml)
//! - Environment variables (IGLU__*)
//!
//! ## Example config file (iglu.toml):
//! ```toml
//! [http]
//! timeout_ms = 3000
//! max_retries = 3
//! user_agent = "iglu-client/0.1.0"
//!
//! [resolver]
//! config_path = "config/resolver.json"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Settings applied to every HTTP registry
    #[serde(default)]
    pub http: HttpSettings,

    /// Where the resolver configuration lives
    #[serde(default)]
    pub resolver: ResolverSettings,
}

/// HTTP registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts after a timed out request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Resolver location settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Path to a resolver configuration JSON file
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

fn default_timeout_ms() -> u64 {
    3_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("iglu-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ClientConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["iglu.toml", ".iglu.toml", "config/iglu.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("com", "snowplowanalytics", "iglu") {
            let xdg_config = dirs.config_dir().join("iglu.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // IGLU__HTTP__TIMEOUT_MS=500
        builder = builder.add_source(
            Environment::with_prefix("IGLU")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
