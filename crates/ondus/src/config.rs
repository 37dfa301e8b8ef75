//! CLI configuration: TOML file + `ONDUS_*` environment, with flag overrides.
//!
//! Layering (lowest to highest): built-in defaults, config file,
//! environment, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use ondus_api::{DEFAULT_BASE_URL, SessionConfig, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Refresh token from the ONDUS app login (prefer the env var).
    #[serde(default, skip_serializing, deserialize_with = "secret")]
    pub refresh_token: Option<SecretString>,

    /// API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Extra CA certificate (PEM) to trust, for intercepting proxies.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_token: None,
            base_url: default_base_url(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "ondus", "ondus").map_or_else(
        || PathBuf::from(".ondus.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the config from `path` (a missing file is fine) and the environment.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ONDUS_").ignore(&["config"]))
        .extract()?;
    Ok(config)
}

/// Everything needed to open a session.
pub struct Resolved {
    pub refresh_token: SecretString,
    pub session: SessionConfig,
}

/// Apply flag overrides on top of the loaded config.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let path = global.config.clone().unwrap_or_else(config_path);
    let config = load_config(&path)?;

    let refresh_token = global
        .refresh_token
        .clone()
        .map(SecretString::from)
        .or(config.refresh_token)
        .filter(|token| !token.expose_secret().trim().is_empty())
        .ok_or_else(|| CliError::NoCredentials {
            path: path.display().to_string(),
        })?;

    let base_url = global.base_url.as_deref().unwrap_or(&config.base_url);
    let mut session =
        SessionConfig::with_base_url(base_url).map_err(|_| CliError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {base_url}"),
        })?;

    session.transport.timeout = Duration::from_secs(global.timeout.unwrap_or(config.timeout));
    session.transport.tls = if global.insecure || config.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ca_path) = config.ca_cert {
        TlsMode::CustomCa(ca_path)
    } else {
        TlsMode::System
    };

    Ok(Resolved {
        refresh_token,
        session,
    })
}
