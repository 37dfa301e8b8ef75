use thiserror::Error;

/// Top-level error type for the `ondus-api` crate.
///
/// Most of the tree API degrades to empty results instead of returning
/// these; they surface from [`Session::new`](crate::Session::new) and
/// [`Session::try_request`](crate::Session::try_request).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The refresh-token exchange was rejected or returned no token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The server kept answering 401 after a fresh access token was issued.
    #[error("Session expired -- request still unauthorized after re-authentication")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success status other than 401.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error means the credentials no longer work.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_flagged_as_expired() {
        assert!(Error::SessionExpired.is_auth_expired());
        assert!(
            Error::Authentication {
                message: "nope".into()
            }
            .is_auth_expired()
        );
        assert!(
            !Error::Api {
                status: 500,
                message: String::new()
            }
            .is_auth_expired()
        );
    }
}
