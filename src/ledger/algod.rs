//! algod v2 HTTP client with multi-endpoint failover

use super::{AccountInformation, LedgerNode, NodeStatus, PendingTransaction};
use crate::config::{Network, NodeConfig};
use crate::error::LedgerError;
use crate::tx::{Address, SignedPayload, SuggestedParams, TxId};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

const TOKEN_HEADER: &str = "X-Algo-API-Token";

#[derive(Debug, Deserialize)]
struct TransactionParamsResponse {
    fee: u64,
    #[serde(rename = "min-fee")]
    min_fee: u64,
    #[serde(rename = "last-round")]
    last_round: u64,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// algod client over one or more equivalent endpoints
pub struct AlgodClient {
    network: Network,
    urls: Vec<String>,
    /// Current active endpoint index
    current: AtomicUsize,
    api_token: Option<String>,
    http: Client,
}

impl AlgodClient {
    /// Create a client for a network's configured endpoints
    pub fn new(network: Network, config: &NodeConfig) -> Result<Self, LedgerError> {
        if config.algod_urls.is_empty() {
            return Err(LedgerError::Transport {
                url: String::new(),
                message: format!("no node URLs configured for {}", network),
            });
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| LedgerError::Transport {
                url: config.algod_urls[0].clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            network,
            urls: config
                .algod_urls
                .iter()
                .map(|url| url.trim_end_matches('/').to_string())
                .collect(),
            current: AtomicUsize::new(0),
            api_token: config.api_token.clone().filter(|token| !token.is_empty()),
            http,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Get the active endpoint
    pub fn base_url(&self) -> &str {
        let idx = self.current.load(Ordering::Relaxed);
        &self.urls[idx % self.urls.len()]
    }

    /// Switch to next available endpoint
    fn failover(&self) {
        let current = self.current.load(Ordering::Relaxed);
        let next = (current + 1) % self.urls.len();
        self.current.store(next, Ordering::Relaxed);
        warn!("{} node failover to endpoint {}", self.network, self.urls[next]);
    }

    /// Run a read against each endpoint in turn until one answers
    async fn call<T, F>(&self, path: &str, build: F) -> Result<T, LedgerError>
    where
        T: DeserializeOwned,
        F: Fn(&Client, String) -> RequestBuilder,
    {
        self.request(path, build, self.urls.len()).await
    }

    /// Run a request against the active endpoint only.
    ///
    /// A transport error still moves later calls to the next endpoint, but
    /// the request itself is never repeated.
    async fn call_once<T, F>(&self, path: &str, build: F) -> Result<T, LedgerError>
    where
        T: DeserializeOwned,
        F: Fn(&Client, String) -> RequestBuilder,
    {
        self.request(path, build, 1).await
    }

    async fn request<T, F>(&self, path: &str, build: F, attempts: usize) -> Result<T, LedgerError>
    where
        T: DeserializeOwned,
        F: Fn(&Client, String) -> RequestBuilder,
    {
        let mut last_error = None;

        for _ in 0..attempts {
            let base = self.base_url().to_string();
            let url = format!("{}{}", base, path);

            let mut request = build(&self.http, url.clone());
            if let Some(token) = &self.api_token {
                request = request.header(TOKEN_HEADER, token);
            }

            match self.execute(request, &url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!("{} node request to {} failed: {}", self.network, url, e);
                    last_error = Some(e);
                    self.failover();
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LedgerError::Transport {
            url: path.to_string(),
            message: "all endpoints failed".to_string(),
        }))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, LedgerError> {
        let response = request.send().await.map_err(|e| LedgerError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| LedgerError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(LedgerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LedgerNode for AlgodClient {
    async fn transaction_params(&self) -> Result<SuggestedParams, LedgerError> {
        let params: TransactionParamsResponse = self
            .call("/v2/transactions/params", |http, url| http.get(url))
            .await?;

        debug!(
            "{} params: last round {}, min fee {}",
            self.network, params.last_round, params.min_fee
        );

        Ok(SuggestedParams::from_last_round(
            params.last_round,
            params.fee,
            params.min_fee,
            params.genesis_id,
            params.genesis_hash,
        ))
    }

    async fn send_raw_transaction(&self, signed: Vec<SignedPayload>) -> Result<TxId, LedgerError> {
        let body: Vec<u8> = signed.iter().flat_map(|p| p.0.iter().copied()).collect();

        // Never resubmitted to another endpoint
        let response: SubmitResponse = self
            .call_once("/v2/transactions", |http, url| {
                http.post(url)
                    .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
                    .body(body.clone())
            })
            .await?;

        Ok(TxId(response.tx_id))
    }

    async fn pending_transaction_information(
        &self,
        tx_id: &TxId,
    ) -> Result<PendingTransaction, LedgerError> {
        let path = format!("/v2/transactions/pending/{}?format=json", tx_id);
        self.call(&path, |http, url| http.get(url)).await
    }

    async fn status(&self) -> Result<NodeStatus, LedgerError> {
        self.call("/v2/status", |http, url| http.get(url)).await
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, LedgerError> {
        let path = format!("/v2/status/wait-for-block-after/{}", round);
        self.call(&path, |http, url| http.get(url)).await
    }

    async fn account_information(
        &self,
        address: &Address,
    ) -> Result<AccountInformation, LedgerError> {
        let path = format!("/v2/accounts/{}?format=json", address);
        self.call(&path, |http, url| http.get(url)).await
    }
}
