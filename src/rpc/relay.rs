use crate::{
    constants::{API_KEY_HEADER, DEFAULT_REQUEST_TIMEOUT},
    error::RelayApiError,
    types::rpc::{
        GetCapabilitiesParams, GetQuoteParams, PrepareCallsParams, PrepareCallsResponse, Quote,
        RelayCapabilities, SendPreparedCallsParams, SendTransactionParams, TaskResponse,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::{
    fmt::{self, Debug},
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::{debug, trace};
use url::Url;

/// Type alias for `Result<T, RelayApiError>`.
pub type Result<T> = core::result::Result<T, RelayApiError>;

/// The relay's `wallet_` namespace.
#[async_trait]
pub trait RelayApi: Debug + Send + Sync {
    /// Prepares calls for the account to sign.
    async fn prepare_calls(&self, params: PrepareCallsParams) -> Result<PrepareCallsResponse>;

    /// Submits calls prepared with [`RelayApi::prepare_calls`].
    async fn send_prepared_calls(&self, params: SendPreparedCallsParams) -> Result<TaskResponse>;

    /// Submits signed calldata.
    async fn send_transaction(&self, params: SendTransactionParams) -> Result<TaskResponse>;

    /// Returns the relay capabilities.
    async fn get_capabilities(&self, params: GetCapabilitiesParams) -> Result<RelayCapabilities>;

    /// Quotes the fee of an execution.
    async fn get_quote(&self, params: GetQuoteParams) -> Result<Quote>;
}

/// [`RelayApi`] over HTTP.
pub struct RelayClient {
    client: Client,
    url: Url,
    api_key: Option<String>,
    next_id: AtomicU64,
}

impl Debug for RelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayClient")
            .field("url", &self.url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RelayClient {
    /// Creates a client for the relay at `url`.
    pub fn new(url: Url, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, url, api_key))
    }

    /// Creates a relay client using an existing HTTP client.
    pub const fn with_client(client: Client, url: Url, api_key: Option<String>) -> Self {
        Self { client, url, api_key, next_id: AtomicU64::new(1) }
    }

    /// Returns the relay url.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    async fn request<P, T>(&self, method: &'static str, params: P) -> Result<T>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": [params],
        });
        trace!(method, %body, "Sending relay request");

        let mut request = self.client.post(self.url.clone()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(method, %status, len = bytes.len(), "Received relay response");

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => parse_response(method, value),
            Err(_) if !status.is_success() => {
                Err(RelayApiError::Rpc { method, message: format!("HTTP {status}") })
            }
            Err(source) => Err(RelayApiError::InvalidResponse { method, source }),
        }
    }
}

/// Extracts the result of a relay response.
///
/// Errors are reported either as a JSON-RPC `error.message` or as a top-level `message`.
fn parse_response<T: DeserializeOwned>(method: &'static str, mut value: Value) -> Result<T> {
    let message = value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str);
    if let Some(message) = message {
        return Err(RelayApiError::Rpc { method, message: message.to_string() });
    }

    match value.get_mut("result").map(Value::take) {
        Some(Value::Null) | None => Err(RelayApiError::MissingResult { method }),
        Some(result) => serde_json::from_value(result)
            .map_err(|source| RelayApiError::InvalidResponse { method, source }),
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn prepare_calls(&self, params: PrepareCallsParams) -> Result<PrepareCallsResponse> {
        self.request("wallet_prepareCalls", params).await
    }

    async fn send_prepared_calls(&self, params: SendPreparedCallsParams) -> Result<TaskResponse> {
        self.request("wallet_sendPreparedCalls", params).await
    }

    async fn send_transaction(&self, params: SendTransactionParams) -> Result<TaskResponse> {
        self.request("wallet_sendTransaction", params).await
    }

    async fn get_capabilities(&self, params: GetCapabilitiesParams) -> Result<RelayCapabilities> {
        self.request("wallet_getCapabilities", params).await
    }

    async fn get_quote(&self, params: GetQuoteParams) -> Result<Quote> {
        self.request("wallet_getQuote", params).await
    }
}
