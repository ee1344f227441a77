//! Fee oracle client.
//!
//! The oracle reports which ERC-20 tokens the relay accepts as fee payment on each chain, where
//! fees have to be paid to, and how much an execution costs in a given token.

use crate::{constants::DEFAULT_REQUEST_TIMEOUT, error::OracleError};
use alloy::primitives::{Address, ChainId, U256};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::fmt::Debug;
use tracing::debug;
use url::Url;

/// Type alias for `Result<T, OracleError>`.
pub type Result<T> = core::result::Result<T, OracleError>;

/// Fee oracle API.
#[async_trait]
pub trait FeeOracle: Debug + Send + Sync {
    /// Returns the ERC-20 tokens accepted as fee payment on `chain_id`.
    async fn payment_tokens(&self, chain_id: ChainId) -> Result<Vec<Address>>;

    /// Returns the address fees are paid to on `chain_id`.
    async fn fee_collector(&self, chain_id: ChainId) -> Result<Address>;

    /// Estimates the fee of an execution, in the smallest unit of `token`.
    async fn estimate_fee(
        &self,
        chain_id: ChainId,
        token: Address,
        gas_limit: u64,
        gas_limit_l1: u64,
    ) -> Result<U256>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentTokensResponse {
    payment_tokens: Vec<Address>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeCollectorResponse {
    fee_collector: Address,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateResponse {
    estimated_fee: U256,
}

/// [`FeeOracle`] served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeeOracle {
    client: Client,
    url: Url,
}

impl HttpFeeOracle {
    /// Creates an oracle client for the service at `url`.
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, url))
    }

    /// Creates an oracle client using an existing HTTP client.
    pub const fn with_client(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    fn endpoint(&self, chain_id: ChainId, path: &str) -> String {
        format!("{}/oracles/{chain_id}/{path}", self.url.as_str().trim_end_matches('/'))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        chain_id: ChainId,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(chain_id, path);
        debug!(%url, ?query, "Querying fee oracle");

        let response = self.client.get(&url).query(query).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(OracleError::UnsupportedChain(chain_id)),
            status if !status.is_success() => {
                Err(OracleError::Status { url, status: status.as_u16() })
            }
            _ => Ok(response.json().await?),
        }
    }
}

#[async_trait]
impl FeeOracle for HttpFeeOracle {
    async fn payment_tokens(&self, chain_id: ChainId) -> Result<Vec<Address>> {
        let response: PaymentTokensResponse = self.get(chain_id, "paymentTokens", &[]).await?;
        Ok(response.payment_tokens)
    }

    async fn fee_collector(&self, chain_id: ChainId) -> Result<Address> {
        let response: FeeCollectorResponse = self.get(chain_id, "feeCollector", &[]).await?;
        Ok(response.fee_collector)
    }

    async fn estimate_fee(
        &self,
        chain_id: ChainId,
        token: Address,
        gas_limit: u64,
        gas_limit_l1: u64,
    ) -> Result<U256> {
        let query = [
            ("paymentToken", token.to_string()),
            ("gasLimit", gas_limit.to_string()),
            ("gasLimitL1", gas_limit_l1.to_string()),
        ];
        let response: EstimateResponse = self.get(chain_id, "estimate", &query).await?;
        Ok(response.estimated_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        let oracle = HttpFeeOracle::new("https://api.gelato.digital/".parse().unwrap()).unwrap();
        assert_eq!(
            oracle.endpoint(8453, "paymentTokens"),
            "https://api.gelato.digital/oracles/8453/paymentTokens"
        );

        let oracle = HttpFeeOracle::new("http://localhost:8080/v1".parse().unwrap()).unwrap();
        assert_eq!(oracle.endpoint(1, "estimate"), "http://localhost:8080/v1/oracles/1/estimate");
    }

    #[test]
    fn responses() {
        let tokens: PaymentTokensResponse = serde_json::from_str(
            r#"{"paymentTokens":["0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"]}"#,
        )
        .unwrap();
        assert_eq!(tokens.payment_tokens.len(), 1);

        let estimate: EstimateResponse =
            serde_json::from_str(r#"{"estimatedFee":"0x2710"}"#).unwrap();
        assert_eq!(estimate.estimated_fee, U256::from(10_000));
    }
}
