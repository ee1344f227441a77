//! EIP-712 related helpers.

use crate::{account::AccountDescriptor, types::Call};
use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256, ChainId, U256},
    sol,
    sol_types::{Eip712Domain, SolStruct},
};

sol! {
    /// The payload an account signs to authorize an ERC-7821 execution.
    #[derive(Debug, serde::Serialize)]
    struct Execute {
        bytes32 mode;
        Call[] calls;
        uint256 nonce;
    }
}

/// Returns the EIP-712 domain of `account` on `chain_id`.
pub fn execute_domain(
    descriptor: &AccountDescriptor,
    chain_id: ChainId,
    account: Address,
) -> Eip712Domain {
    Eip712Domain::new(
        Some(descriptor.name.clone().into()),
        Some(descriptor.version.clone().into()),
        Some(U256::from(chain_id)),
        Some(account),
        None,
    )
}

/// Computes the EIP-712 digest and typed data of an execution.
pub fn compute_execute_data(
    descriptor: &AccountDescriptor,
    chain_id: ChainId,
    account: Address,
    calls: &[Call],
    nonce: U256,
) -> (B256, TypedData) {
    let domain = execute_domain(descriptor, chain_id, account);
    let payload = Execute { mode: descriptor.execution_mode, calls: calls.to_vec(), nonce };

    let digest = payload.eip712_signing_hash(&domain);
    let typed_data = TypedData::from_struct(&payload, Some(domain));

    debug_assert_eq!(Ok(digest), typed_data.eip712_signing_hash());

    (digest, typed_data)
}
