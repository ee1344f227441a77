//! Signing of execution payloads.

use crate::{
    account::{SignatureScheme, SmartAccount},
    eip712::compute_execute_data,
    error::SmartWalletError,
    types::{Call, OpData},
};
use alloy::primitives::{B256, Bytes, ChainId, U256, aliases::U192};
use tracing::debug;

/// A signed execution, ready to be sent to the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExecution {
    /// The account nonce the payload was signed with.
    pub nonce: U256,
    /// The EIP-712 digest of the payload.
    pub digest: B256,
    /// The `opData` passed to the executor.
    pub op_data: OpData,
    /// The `execute` calldata.
    pub data: Bytes,
}

/// Signs `calls` with `account` under `nonce_key` and encodes the final calldata.
///
/// The account nonce is read for `nonce_key`, the `Execute` typed data is signed according to the
/// account's [`SignatureScheme`], and the signature is packed into the `opData` of the execution.
pub async fn sign_calls(
    account: &dyn SmartAccount,
    chain_id: ChainId,
    calls: &[Call],
    nonce_key: U192,
) -> Result<SignedExecution, SmartWalletError> {
    let nonce = account.get_nonce(nonce_key).await.map_err(SmartWalletError::account)?;
    let descriptor = account.descriptor();

    let (digest, typed_data) =
        compute_execute_data(descriptor, chain_id, account.address(), calls, nonce);

    let signature = match descriptor.signature_scheme {
        SignatureScheme::TypedData => account.sign_typed_data(&typed_data).await,
        SignatureScheme::Hash => account.sign_message(digest.as_slice()).await,
    }
    .map_err(SmartWalletError::account)?;
    debug!(account = %account.address(), %nonce, %digest, "Signed execution");

    let op_data = OpData::new(nonce_key, signature);
    let data = account.encode_calls(calls, Some(&op_data)).map_err(SmartWalletError::account)?;

    Ok(SignedExecution { nonce, digest, op_data, data })
}
