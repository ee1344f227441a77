use alloy::primitives::Address;
use thiserror::Error;

/// Errors related to 7702 authorizations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The signed authorization does not recover to the authorizing account.
    ///
    /// This is a local failure of the account's signer, the authorization is never sent.
    #[error("authorization verification failed, expected {expected}, recovered {recovered:?}")]
    AuthorizationVerificationFailed {
        /// The account expected to sign the authorization.
        expected: Address,
        /// The recovered signer, if recovery succeeded at all.
        recovered: Option<Address>,
    },
    /// The account needs a delegation but cannot sign authorizations.
    #[error("account {0} cannot sign EIP-7702 authorizations")]
    MissingAuthorizationSigner(Address),
}

impl AuthError {
    /// Converts the error to a boxed [`AuthError`].
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }
}
