use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::presence::ambient::{AmbientBaseline, DEFAULT_BUCKET_MS};
use crate::presence::registry::DEFAULT_EXPIRY_WINDOW_MS;

// Only flags given explicitly (or via their env var) are serialized, so an
// absent flag never masks a value from the TOML file.
#[derive(Parser, Serialize, Clone, Debug, Default)]
#[command(name = "lounge-server", version, about = "Lounge listener presence server")]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "LOUNGE_PORT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long, env = "LOUNGE_BIND_ADDRESS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Path to TOML config file
    #[arg(long, default_value = "./lounge.toml")]
    #[serde(skip)]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "LOUNGE_JSON_LOGS")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    #[serde(skip)]
    pub generate_config: bool,
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub json_logs: bool,

    /// Presence registry settings (loaded from [presence] section in TOML)
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Ambient padding settings (loaded from [ambient] section in TOML)
    #[serde(default)]
    pub ambient: AmbientConfig,
}

/// Configuration for the listener presence registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Silence in milliseconds after which a listener stops being counted (default: 30000)
    #[serde(default = "default_expiry_window_ms")]
    pub expiry_window_ms: u64,

    /// Interval in seconds between background sweeps; 0 disables the task (default: 0)
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            expiry_window_ms: DEFAULT_EXPIRY_WINDOW_MS,
            sweep_interval_secs: 0,
        }
    }
}

fn default_expiry_window_ms() -> u64 {
    DEFAULT_EXPIRY_WINDOW_MS
}

/// Configuration for the ambient baseline blended into public counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientConfig {
    /// Whether public counts include the ambient baseline (default: true)
    #[serde(default = "default_ambient_enabled")]
    pub enabled: bool,

    /// Seconds per ambient bucket; the baseline changes once per bucket (default: 45)
    #[serde(default = "default_bucket_secs")]
    pub bucket_secs: u64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket_secs: default_bucket_secs(),
        }
    }
}

fn default_ambient_enabled() -> bool {
    true
}

fn default_bucket_secs() -> u64 {
    DEFAULT_BUCKET_MS / 1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".to_string(),
            json_logs: false,
            presence: PresenceConfig::default(),
            ambient: AmbientConfig::default(),
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (LOUNGE_*) < CLI args
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }

    /// The layered provider stack behind [`Config::load`].
    /// Nested keys use a double underscore: `LOUNGE_PRESENCE__EXPIRY_WINDOW_MS`.
    pub fn figment(cli: &Cli) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed("LOUNGE_").split("__"))
            .merge(Serialized::defaults(cli))
    }

    pub fn ambient_baseline(&self) -> AmbientBaseline {
        AmbientBaseline {
            enabled: self.ambient.enabled,
            bucket_ms: self.ambient.bucket_secs.max(1).saturating_mul(1000),
        }
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Lounge Presence Server Configuration
# Place this file at ./lounge.toml or specify with --config <path>
# All settings can be overridden via environment variables (LOUNGE_PORT,
# LOUNGE_PRESENCE__EXPIRY_WINDOW_MS, etc.) or CLI flags (--port, etc.)

# Server port (default: 3000)
# port = 3000

# Bind address (default: 0.0.0.0 - all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# ---- Listener Presence ----
# [presence]

# Silence in milliseconds after which a listener is no longer counted
# expiry_window_ms = 30000

# Background sweep interval in seconds (0 disables it; sweeps then run only on heartbeat/query)
# sweep_interval_secs = 0

# ---- Ambient Baseline ----
# [ambient]

# Blend a synthetic per-channel baseline into public counts
# enabled = true

# Seconds per baseline bucket; the baseline drifts once per bucket
# bucket_secs = 45
"#
    .to_string()
}
