//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("No refresh token configured")]
    #[diagnostic(
        code(ondus::no_credentials),
        help(
            "Set refresh_token in {path},\n\
             export ONDUS_REFRESH_TOKEN, or pass --refresh-token."
        )
    )]
    NoCredentials { path: String },

    #[error("Authentication failed")]
    #[diagnostic(
        code(ondus::auth_failed),
        help("The refresh token was rejected. Log in to the ONDUS app again and copy a new one.")
    )]
    AuthFailed,

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(ondus::not_found),
        help("Run `ondus appliances` to list the ids known to your account.")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Input ────────────────────────────────────────────────────────

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(ondus::validation))]
    Validation { field: String, reason: String },

    // ── Wrapped ──────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(ondus::config), help("Check the TOML syntax of your config file."))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(ondus::api))]
    Api(#[from] ondus_api::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(ondus::render))]
    Render(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCredentials { .. } | Self::AuthFailed => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Api(e) if e.is_auth_expired() => exit_code::AUTH,
            Self::Api(ondus_api::Error::Transport(_) | ondus_api::Error::Tls(_)) => {
                exit_code::CONNECTION
            }
            Self::Config(_) | Self::Api(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}
