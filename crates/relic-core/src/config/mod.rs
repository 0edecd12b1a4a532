use crate::error::{RelicError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Sent upstream as `apollographql-client-name`.
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            client_name: default_client_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_web_host")]
    pub host: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            host: default_web_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_count")]
    pub default_count: u32,
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    /// Echoed to clients as `maxActions` in get responses.
    #[serde(default = "default_max_actions")]
    pub max_actions: u32,
    /// Consumer ids belonging to browser extensions.
    #[serde(default = "default_extension_consumer_ids")]
    pub extension_consumer_ids: Vec<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
            max_actions: default_max_actions(),
            extension_consumer_ids: default_extension_consumer_ids(),
        }
    }
}

// -- Defaults --

fn default_upstream_url() -> String {
    "http://localhost:4001/graphql".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_client_name() -> String {
    "relic-v3-proxy".to_string()
}
fn default_web_port() -> u16 {
    8787
}
fn default_web_host() -> String {
    "127.0.0.1".to_string()
}
fn default_count() -> u32 {
    30
}
fn default_max_count() -> u32 {
    5000
}
fn default_max_actions() -> u32 {
    30
}
fn default_extension_consumer_ids() -> Vec<u32> {
    vec![7035, 73360, 70419, 73362]
}

impl RelicConfig {
    /// Load configuration with three layers, later layers winning:
    /// 1. ~/.config/relic/config.toml (global)
    /// 2. `explicit`, when given (`--config`)
    /// 3. `RELIC__SECTION__KEY` environment variables
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(RelicError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        builder = builder.add_source(
            Environment::with_prefix("RELIC")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("api.extension_consumer_ids")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| RelicError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| RelicError::Config(e.to_string()))?;

        cfg.validate();
        Ok(cfg)
    }

    /// Defaults only (no files, no environment).
    pub fn default_config() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            web: WebConfig::default(),
            api: ApiConfig::default(),
        }
    }

    /// Clamp out-of-range values, logging a warning for each fix.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        let positive_checks: Vec<(&str, &mut u32)> = vec![
            ("api.default_count", &mut self.api.default_count),
            ("api.max_count", &mut self.api.max_count),
            ("api.max_actions", &mut self.api.max_actions),
        ];
        for (name, val) in positive_checks {
            if *val == 0 {
                warnings.push(format!("{name} = 0, setting to 1"));
                *val = 1;
            }
        }

        if self.api.default_count > self.api.max_count {
            warnings.push(format!(
                "api.default_count ({}) > api.max_count ({}), lowering default",
                self.api.default_count, self.api.max_count
            ));
            self.api.default_count = self.api.max_count;
        }

        if self.upstream.timeout_secs == 0 {
            warnings.push("upstream.timeout_secs = 0, setting to 30".to_string());
            self.upstream.timeout_secs = default_timeout_secs();
        }

        if !self.upstream.url.starts_with("http://") && !self.upstream.url.starts_with("https://")
        {
            warnings.push(format!(
                "upstream.url '{}' has no http(s) scheme",
                self.upstream.url
            ));
        }

        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }
}

fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("relic").join("config.toml"))
}
