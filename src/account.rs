//! Smart account capability interface.
//!
//! The client is polymorphic over [`SmartAccount`]. Concrete accounts (Safe, ERC-7579 modular
//! accounts, EIP-7702 delegated EOAs) live outside of this crate and only need to implement this
//! surface.

use crate::types::{Call, OpData};
use alloy::{
    dyn_abi::TypedData,
    eips::eip7702::{Authorization, SignedAuthorization},
    primitives::{Address, B256, Bytes, U256, aliases::U192},
};
use async_trait::async_trait;
use std::fmt::Debug;

/// How an account expects its execution payload to be signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    /// Sign the EIP-712 typed data.
    #[default]
    TypedData,
    /// Sign the EIP-712 digest as a personal message.
    Hash,
}

/// Static properties of an account implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDescriptor {
    /// EIP-712 domain name.
    pub name: String,
    /// EIP-712 domain version.
    pub version: String,
    /// ERC-7821 execution mode the account signs over.
    pub execution_mode: B256,
    /// How the execution payload is signed.
    pub signature_scheme: SignatureScheme,
}

/// An EIP-7702 delegation the account relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorizationInfo {
    /// The delegate contract.
    pub address: Address,
    /// The authorizing EOA.
    pub account: Address,
}

/// A smart account the client can send calls through.
#[async_trait]
pub trait SmartAccount: Debug + Send + Sync {
    /// The account address. Calls are sent to this address.
    fn address(&self) -> Address;

    /// Static properties of the account.
    fn descriptor(&self) -> &AccountDescriptor;

    /// The EIP-7702 delegation the account relies on, if any.
    fn authorization(&self) -> Option<&AuthorizationInfo> {
        None
    }

    /// Whether the account has code on chain.
    ///
    /// Exposed for callers inspecting the account. Authorization and gas estimation read the
    /// authority's code directly and compare it against the expected delegation designator.
    async fn is_deployed(&self) -> eyre::Result<bool>;

    /// Returns the account nonce for `key`.
    async fn get_nonce(&self, key: U192) -> eyre::Result<U256>;

    /// Encodes `calls` into calldata for the account's execution entry point.
    fn encode_calls(&self, calls: &[Call], op_data: Option<&OpData>) -> eyre::Result<Bytes>;

    /// Decodes calldata produced by [`SmartAccount::encode_calls`].
    fn decode_calls(&self, data: &[u8]) -> eyre::Result<Vec<Call>>;

    /// Signs `message` as an EIP-191 personal message.
    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Bytes>;

    /// Signs EIP-712 typed data.
    async fn sign_typed_data(&self, typed_data: &TypedData) -> eyre::Result<Bytes>;

    /// Signs an ERC-4337 user operation hash.
    async fn sign_user_operation(&self, hash: B256) -> eyre::Result<Bytes>;

    /// Signs an EIP-7702 authorization.
    ///
    /// Returns `None` if the account cannot sign authorizations.
    async fn sign_authorization(
        &self,
        _authorization: Authorization,
    ) -> Option<eyre::Result<SignedAuthorization>> {
        None
    }
}
