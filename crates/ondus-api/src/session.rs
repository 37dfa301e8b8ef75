// Session facade
//
// Entry point for callers: owns the token pair (through the shared
// `ApiClient`), the top-level location cache, and the flattened
// room/appliance traversals.

use std::pin::pin;
use std::sync::Arc;

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use reqwest::Method;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::appliance::Appliance;
use crate::client::ApiClient;
use crate::error::Error;
use crate::location::Location;
use crate::room::Room;
use crate::transport::{HttpTransport, ReqwestTransport, TransportConfig};
use crate::tree::{Collection, records};

/// Root of the ONDUS IoT API; every resource path is relative to it.
pub const DEFAULT_BASE_URL: &str = "https://idp2-apigw.cloud.grohe.com/v3/iot/";

/// Connection settings for [`Session::new`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: Url,
    pub transport: TransportConfig,
}

impl SessionConfig {
    /// Config pointing at a custom service root (staging, proxies, tests).
    ///
    /// A missing trailing slash is added so relative paths resolve below it.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        Ok(Self {
            base_url,
            transport: TransportConfig::default(),
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|e| {
                unreachable!("DEFAULT_BASE_URL is a valid URL: {e}")
            }),
            transport: TransportConfig::default(),
        }
    }
}

/// Authenticated session against the ONDUS cloud.
///
/// Every accessor that touches the network degrades to an empty result on
/// failure; the cause is logged through `tracing`. A session is meant to
/// be driven by one logical caller at a time: independent traversals run
/// concurrently against the same session may ingest the same records
/// twice.
pub struct Session {
    client: Arc<ApiClient>,
    locations: Collection<Location>,
}

impl Session {
    /// Create a session using the reqwest transport.
    pub fn new(refresh_token: SecretString, config: &SessionConfig) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(&config.transport)?;
        Ok(Self::with_transport(
            refresh_token,
            config.base_url.clone(),
            Arc::new(transport),
        ))
    }

    /// Create a session over any [`HttpTransport`].
    pub fn with_transport(
        refresh_token: SecretString,
        base_url: Url,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            client: Arc::new(ApiClient::new(transport, base_url, refresh_token)),
            locations: Collection::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    pub fn refresh_token(&self) -> &SecretString {
        self.client.refresh_token()
    }

    /// The current access token, `None` until the first successful exchange.
    pub fn access_token(&self) -> Option<SecretString> {
        self.client.access_token()
    }

    /// Seed or replace the access token (e.g. one cached by the caller).
    pub fn set_access_token(&self, token: SecretString) {
        self.client.set_access_token(token);
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange the refresh token for a new access token via
    /// `POST oidc/refresh`.
    ///
    /// Returns `false` and keeps the previous token when the exchange is
    /// rejected. Never retries.
    pub async fn get_access_token(&self) -> bool {
        self.client.get_access_token().await
    }

    /// Authenticated call returning the decoded JSON body.
    ///
    /// Obtains a token first if none is held. A 401 triggers one token
    /// refresh and one retry, so at most two HTTP attempts are made. Any
    /// failure is logged and yields `Value::Null`.
    pub async fn request(&self, path: &str, data: Option<&Value>, method: Method) -> Value {
        self.client.request(path, data, method).await
    }

    /// Same protocol as [`request`](Self::request), but reports the failure.
    pub async fn try_request(
        &self,
        path: &str,
        data: Option<&Value>,
        method: Method,
    ) -> Result<Value, Error> {
        self.client.try_request(path, data, method).await
    }

    // ── Resource tree ────────────────────────────────────────────────

    /// Fetch the dashboard and merge its embedded locations (with their
    /// rooms and appliances) into the tree.
    ///
    /// Existing nodes are updated in place; repeated calls never duplicate.
    pub async fn discover(&self) {
        let dashboard = self.client.request("dashboard", None, Method::GET).await;
        let locations = match dashboard {
            Value::Object(mut dashboard) => dashboard.remove("locations").map(records),
            Value::Null => None,
            other => {
                warn!(value = %other, "unexpected dashboard shape");
                None
            }
        };

        let locations = locations.unwrap_or_default();
        debug!(count = locations.len(), "merging dashboard locations");
        self.merge_locations(locations);
    }

    /// All locations, fetched from `locations` until a non-empty list has
    /// been seen.
    pub async fn locations(&self) -> Vec<Location> {
        if !self.locations.is_loaded() {
            let response = self.client.request("locations", None, Method::GET).await;
            self.merge_locations(records(response));
        }
        self.locations.snapshot()
    }

    /// Look up an already known location. Never fetches.
    pub fn location(&self, id: i64) -> Option<Location> {
        self.locations.get(&id)
    }

    /// Every room of every location, loading each level lazily as the
    /// stream is polled. Each call starts a fresh traversal.
    pub fn rooms(&self) -> impl Stream<Item = Room> + Send + '_ {
        stream! {
            for location in self.locations().await {
                for room in location.rooms().await {
                    yield room;
                }
            }
        }
    }

    /// First room with the given id, stopping the traversal once found.
    pub async fn room(&self, id: i64) -> Option<Room> {
        let mut rooms = pin!(self.rooms());
        while let Some(room) = rooms.next().await {
            if room.id() == id {
                return Some(room);
            }
        }
        None
    }

    /// Every appliance of every room, loaded lazily like [`rooms`](Self::rooms).
    pub fn appliances(&self) -> impl Stream<Item = Appliance> + Send + '_ {
        stream! {
            let mut rooms = pin!(self.rooms());
            while let Some(room) = rooms.next().await {
                for appliance in room.appliances().await {
                    yield appliance;
                }
            }
        }
    }

    /// First appliance with the given id, stopping the traversal once found.
    pub async fn appliance(&self, id: &str) -> Option<Appliance> {
        let mut appliances = pin!(self.appliances());
        while let Some(appliance) = appliances.next().await {
            if appliance.id() == id {
                return Some(appliance);
            }
        }
        None
    }

    fn merge_locations(&self, locations: Vec<Value>) {
        let client = &self.client;
        self.locations
            .merge(locations, |record| Some(Location::new(Arc::clone(client), record)));
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.client.base_url().as_str())
            .field("authenticated", &self.client.access_token().is_some())
            .finish_non_exhaustive()
    }
}
