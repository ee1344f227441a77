//! Relay JSON-RPC request and response types.

use super::{Call, TaskId};
use alloy::{
    dyn_abi::TypedData,
    eips::eip7702::SignedAuthorization,
    primitives::{Address, B256, Bytes, ChainId, U256},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An EIP-7702 authorization as accepted by the relay.
///
/// The relay expects the `(chainId, address, nonce, yParity, r, s)` tuple without a `v` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAuthorization {
    /// The chain the authorization is valid on.
    pub chain_id: U256,
    /// The delegate contract.
    pub address: Address,
    /// The authority's transaction count at signing time.
    #[serde(with = "alloy::serde::quantity")]
    pub nonce: u64,
    /// The signature parity.
    #[serde(with = "alloy::serde::quantity")]
    pub y_parity: u8,
    /// The signature `r` value.
    pub r: U256,
    /// The signature `s` value.
    pub s: U256,
}

impl From<&SignedAuthorization> for RelayAuthorization {
    fn from(auth: &SignedAuthorization) -> Self {
        Self {
            chain_id: *auth.chain_id(),
            address: *auth.address(),
            nonce: auth.nonce(),
            y_parity: auth.y_parity(),
            r: auth.r(),
            s: auth.s(),
        }
    }
}

/// Request parameters for `wallet_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionParams {
    /// Target chain ID.
    #[serde(with = "alloy::serde::quantity")]
    pub chain_id: ChainId,
    /// The smart account the calldata is sent to.
    pub target: Address,
    /// The signed `execute` calldata.
    pub data: Bytes,
    /// The token the fee is paid in, for non-sponsored payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<Address>,
    /// The sponsor API key, for sponsored payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_api_key: Option<String>,
    /// Authorizations to apply before executing the calldata.
    #[serde(default)]
    pub authorization_list: Vec<RelayAuthorization>,
}

/// Response of the relay's submission methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    /// The task created for the submission.
    #[serde(default)]
    pub task_id: Option<TaskId>,
}

/// Request parameters for `wallet_prepareCalls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareCallsParams {
    /// Target chain ID.
    #[serde(with = "alloy::serde::quantity")]
    pub chain_id: ChainId,
    /// The account to prepare the calls for.
    pub from: Address,
    /// Calls to prepare.
    pub calls: Vec<Call>,
    /// The token the fee is paid in. Omitted for sponsored calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<Address>,
}

/// Response of `wallet_prepareCalls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareCallsResponse {
    /// Relay context that must be sent back with [`SendPreparedCallsParams`].
    pub context: serde_json::Value,
    /// Digest the account has to sign.
    pub digest: B256,
    /// The typed data behind [`Self::digest`], when the relay provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed_data: Option<TypedData>,
}

/// Request parameters for `wallet_sendPreparedCalls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPreparedCallsParams {
    /// Context returned by `wallet_prepareCalls`.
    pub context: serde_json::Value,
    /// Signature over the prepared digest.
    pub signature: Bytes,
    /// Authorizations to apply before executing the calls.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorization_list: Vec<RelayAuthorization>,
}

/// Request parameters for `wallet_getCapabilities`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCapabilitiesParams {
    /// Chains to fetch capabilities for. Empty means all supported chains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain_ids: Vec<ChainId>,
}

/// Relay capabilities on a single chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainCapabilities {
    /// The address fees are paid to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_collector: Option<Address>,
    /// Tokens accepted as fee payment.
    #[serde(default)]
    pub tokens: Vec<Address>,
}

/// Response of `wallet_getCapabilities`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayCapabilities(
    #[serde(with = "alloy::serde::quantity::hashmap")] pub HashMap<ChainId, ChainCapabilities>,
);

impl RelayCapabilities {
    /// Returns the capabilities on `chain_id`.
    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainCapabilities> {
        self.0.get(&chain_id)
    }
}

/// Request parameters for `wallet_getQuote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetQuoteParams {
    /// Target chain ID.
    #[serde(with = "alloy::serde::quantity")]
    pub chain_id: ChainId,
    /// The token the fee is quoted in.
    pub fee_token: Address,
    /// Gas limit of the execution.
    pub gas_limit: U256,
    /// L1 data gas of the execution, for rollups.
    #[serde(default)]
    pub gas_limit_l1: U256,
}

/// Response of `wallet_getQuote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// The quoted fee, in the smallest unit of the fee token.
    pub fee: U256,
    /// The token the fee is quoted in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<Address>,
}
