//! EIP-7702 authorization decisions.

use super::PipelineMetrics;
use crate::{
    account::SmartAccount,
    chain::ChainApi,
    error::{AuthError, SmartWalletError},
};
use alloy::{
    eips::eip7702::{Authorization, SignedAuthorization, constants::EIP7702_DELEGATION_DESIGNATOR},
    primitives::{Address, Bytes, ChainId, U256},
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

/// Returns the code of an account delegated to `delegate`.
pub fn delegation_designator(delegate: Address) -> Bytes {
    [&EIP7702_DELEGATION_DESIGNATOR[..], delegate.as_slice()].concat().into()
}

/// Whether `code` delegates to `delegate`.
pub fn is_delegated_to(code: &[u8], delegate: Address) -> bool {
    code.strip_prefix(&EIP7702_DELEGATION_DESIGNATOR[..])
        .is_some_and(|target| target == delegate.as_slice())
}

/// Decides whether a submission needs an EIP-7702 authorization and signs it.
///
/// Decisions for the same authority are serialized. The last signed authorization is kept per
/// authority and reused while the authority's transaction count is unchanged, so concurrent
/// submissions made before the delegation lands share one signature instead of each signing
/// their own.
#[derive(Debug)]
pub struct AuthorizationCoordinator {
    chain: Arc<dyn ChainApi>,
    /// Cached chain id of the provider.
    chain_id: OnceCell<ChainId>,
    /// Last signed authorization per authority.
    authorities: DashMap<Address, Arc<Mutex<Option<SignedAuthorization>>>>,
    metrics: Arc<PipelineMetrics>,
}

impl AuthorizationCoordinator {
    /// Creates a new [`AuthorizationCoordinator`].
    pub fn new(chain: Arc<dyn ChainApi>, metrics: Arc<PipelineMetrics>) -> Self {
        Self { chain, chain_id: OnceCell::new(), authorities: DashMap::new(), metrics }
    }

    /// Returns the chain id, fetching it on first use.
    pub async fn chain_id(&self) -> Result<ChainId, SmartWalletError> {
        self.chain_id.get_or_try_init(|| self.chain.chain_id()).await.copied()
    }

    /// Returns the authorizations to attach to a submission from `account`.
    ///
    /// The list is empty if the account does not rely on a delegation or is already delegated to
    /// the expected contract, and has exactly one verified entry otherwise.
    pub async fn authorization_list(
        &self,
        account: &dyn SmartAccount,
    ) -> Result<Vec<SignedAuthorization>, SmartWalletError> {
        let Some(info) = account.authorization().copied() else {
            return Ok(Vec::new());
        };

        // Locks dashmap internally for a short duration to clone the `Arc`.
        let slot = Arc::clone(self.authorities.entry(info.account).or_default().value());
        let mut last_signed = slot.lock().await;

        let code = self.chain.get_code(info.account).await?;
        if is_delegated_to(&code, info.address) {
            debug!(authority = %info.account, delegate = %info.address, "Account already delegated");
            *last_signed = None;
            return Ok(Vec::new());
        }

        let (chain_id, nonce) =
            tokio::try_join!(self.chain_id(), self.chain.transaction_count(info.account))?;
        let authorization =
            Authorization { chain_id: U256::from(chain_id), address: info.address, nonce };

        if let Some(signed) = last_signed.as_ref().filter(|signed| {
            signed.chain_id() == &authorization.chain_id
                && signed.address() == &authorization.address
                && signed.nonce() == authorization.nonce
        }) {
            debug!(authority = %info.account, nonce, "Reusing pending authorization");
            return Ok(vec![signed.clone()]);
        }

        let signed = account
            .sign_authorization(authorization)
            .await
            .ok_or(AuthError::MissingAuthorizationSigner(info.account))?
            .map_err(SmartWalletError::account)?;

        let recovered = signed.recover_authority().ok();
        if recovered != Some(info.account) {
            return Err(AuthError::AuthorizationVerificationFailed {
                expected: info.account,
                recovered,
            }
            .into());
        }

        info!(authority = %info.account, delegate = %info.address, nonce, "Signed authorization");
        self.metrics.authorizations_signed.increment(1);
        *last_signed = Some(signed.clone());

        Ok(vec![signed])
    }
}
