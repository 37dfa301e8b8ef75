// Authenticated request protocol
//
// Holds the refresh/access token pair and wraps an `HttpTransport` with
// URL construction, bearer headers, the 401 refresh-and-retry-once rule
// and JSON decoding. Shared by the session and every tree node through an
// `Arc`, so nodes can fetch without pointing back at their parents.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Upper bound on HTTP attempts for one logical call: the initial try plus
/// one retry after a token refresh.
pub(crate) const MAX_ATTEMPTS: usize = 2;

const REFRESH_PATH: &str = "oidc/refresh";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub(crate) struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
    refresh_token: SecretString,
    access_token: RwLock<Option<SecretString>>,
}

impl ApiClient {
    pub(crate) fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: Url,
        refresh_token: SecretString,
    ) -> Self {
        Self {
            transport,
            base_url,
            refresh_token,
            access_token: RwLock::new(None),
        }
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    pub(crate) fn access_token(&self) -> Option<SecretString> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_access_token(&self, token: SecretString) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Resolve a service-relative path against the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::InvalidUrl)
    }

    // ── Token lifecycle ──────────────────────────────────────────────

    /// Exchange the refresh token for a new access token.
    ///
    /// Leaves the stored access token untouched on failure.
    pub(crate) async fn refresh_access_token(&self) -> Result<(), Error> {
        let url = self.url(REFRESH_PATH)?;
        debug!("refreshing access token at {}", url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = json!({ "refresh_token": self.refresh_token.expose_secret() });

        let resp = self
            .transport
            .execute(HttpRequest {
                method: Method::POST,
                url,
                headers,
                body: Some(body),
            })
            .await?;

        if !is_accepted(resp.status) {
            return Err(Error::Authentication {
                message: format!(
                    "token refresh failed (HTTP {}): {}",
                    resp.status,
                    preview(&resp.body)
                ),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&resp.body).map_err(|e| Error::Authentication {
                message: format!("token refresh returned no access token: {e}"),
            })?;
        self.set_access_token(token.access_token.into());

        debug!("access token refreshed");
        Ok(())
    }

    /// Boolean form of [`refresh_access_token`](Self::refresh_access_token).
    pub(crate) async fn get_access_token(&self) -> bool {
        match self.refresh_access_token().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "could not get access token");
                false
            }
        }
    }

    // ── Request protocol ─────────────────────────────────────────────

    /// Perform an authenticated call, surfacing failures as typed errors.
    pub(crate) async fn try_request(
        &self,
        path: &str,
        data: Option<&Value>,
        method: Method,
    ) -> Result<Value, Error> {
        if self.access_token().is_none() {
            self.refresh_access_token().await?;
        }

        let url = self.url(path)?;

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(%method, %url, attempt, "sending request");

            let request = self.authorized(method.clone(), url.clone(), data)?;
            let resp = self.transport.execute(request).await?;

            if resp.status != StatusCode::UNAUTHORIZED {
                return decode(resp);
            }
            // No refresh after the last attempt: its token could not be used.
            if attempt == MAX_ATTEMPTS {
                break;
            }

            info!("access token expired, fetching a new one");
            self.refresh_access_token().await?;
        }

        Err(Error::SessionExpired)
    }

    /// Perform an authenticated call, degrading every failure to
    /// `Value::Null` after logging it.
    pub(crate) async fn request(&self, path: &str, data: Option<&Value>, method: Method) -> Value {
        match self.try_request(path, data, method).await {
            Ok(value) => value,
            Err(e) if e.is_auth_expired() => {
                warn!(path, error = %e, "request aborted, not authenticated");
                Value::Null
            }
            Err(e) => {
                error!(path, error = %e, "could not access API");
                Value::Null
            }
        }
    }

    fn authorized(
        &self,
        method: Method,
        url: Url,
        data: Option<&Value>,
    ) -> Result<HttpRequest, Error> {
        let token = self.access_token().ok_or_else(|| Error::Authentication {
            message: "no access token".into(),
        })?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| Error::Authentication {
                message: "access token is not a valid header value".into(),
            })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, bearer);

        Ok(HttpRequest {
            method,
            url,
            headers,
            body: data.cloned(),
        })
    }
}

/// The service answers successful calls with 200 or 201 only.
fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

fn decode(resp: HttpResponse) -> Result<Value, Error> {
    if !is_accepted(resp.status) {
        return Err(Error::Api {
            status: resp.status.as_u16(),
            message: preview(&resp.body).to_owned(),
        });
    }

    if resp.body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&resp.body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&resp.body)),
        body: resp.body.clone(),
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
