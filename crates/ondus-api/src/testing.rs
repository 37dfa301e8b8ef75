// In-crate transport double for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;
use crate::session::DEFAULT_BASE_URL;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Replays canned responses in order and records every request.
///
/// Once the script runs dry every call answers 500.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new<'a>(script: impl IntoIterator<Item = (u16, &'a str)>) -> Arc<Self> {
        let script = script
            .into_iter()
            .map(|(status, body)| {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::IM_A_TEAPOT);
                HttpResponse::new(status, body)
            })
            .collect();
        Arc::new(Self {
            script: Mutex::new(script),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Transport that fails every call, for tests that must stay offline.
    pub(crate) fn offline() -> Arc<Self> {
        Self::new([])
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, Error>> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "script exhausted"));
        Box::pin(async move { Ok(next) })
    }
}

pub(crate) fn client_with(transport: &Arc<ScriptedTransport>) -> ApiClient {
    let transport: Arc<dyn HttpTransport> = transport.clone();
    let base_url = Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|e| panic!("bad base url: {e}"));
    ApiClient::new(transport, base_url, "refresh-secret".to_owned().into())
}

/// Client that already holds an access token, so tree tests only see
/// resource calls.
pub(crate) fn authed_client(transport: &Arc<ScriptedTransport>) -> Arc<ApiClient> {
    let client = client_with(transport);
    client.set_access_token("token".to_owned().into());
    Arc::new(client)
}
