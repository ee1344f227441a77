//! Chain reads used while building a submission.

use crate::{error::SmartWalletError, types::IERC20};
use alloy::{
    primitives::{Address, Bytes, ChainId, U256},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionRequest, state::StateOverride},
};
use async_trait::async_trait;
use std::fmt::{self, Debug};

/// Type alias for `Result<T, SmartWalletError>`.
pub type Result<T> = core::result::Result<T, SmartWalletError>;

/// Balance and metadata of an ERC-20 token for one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// Balance of the owner.
    pub balance: U256,
    /// Token decimals.
    pub decimals: u8,
    /// Token symbol.
    pub symbol: String,
}

/// A gas estimation request.
#[derive(Debug, Clone, Default)]
pub struct GasEstimate {
    /// The sender.
    pub from: Address,
    /// The target.
    pub to: Address,
    /// The calldata.
    pub data: Bytes,
    /// State overrides applied during the estimation.
    pub overrides: Option<StateOverride>,
}

/// Read access to the chain a client submits to.
#[async_trait]
pub trait ChainApi: Debug + Send + Sync {
    /// Returns the chain ID.
    async fn chain_id(&self) -> Result<ChainId>;

    /// Returns the code deployed at `address`.
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    /// Returns the transaction count of `address`.
    async fn transaction_count(&self, address: Address) -> Result<u64>;

    /// Returns the native balance of `address`.
    async fn native_balance(&self, address: Address) -> Result<U256>;

    /// Reads balance and metadata of `token` for `owner` in a single batch.
    async fn token_info(&self, token: Address, owner: Address) -> Result<TokenInfo>;

    /// Estimates the gas used by a call.
    async fn estimate_gas(&self, request: GasEstimate) -> Result<u64>;
}

/// [`ChainApi`] backed by an RPC provider.
#[derive(Clone)]
pub struct RpcChain {
    provider: DynProvider,
}

impl Debug for RpcChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcChain").finish_non_exhaustive()
    }
}

impl RpcChain {
    /// Creates a new [`RpcChain`].
    pub fn new<P: Provider + 'static>(provider: P) -> Self {
        Self { provider: provider.erased() }
    }

    /// Returns the underlying provider.
    pub const fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainApi for RpcChain {
    async fn chain_id(&self) -> Result<ChainId> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        Ok(self.provider.get_transaction_count(address).await?)
    }

    async fn native_balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn token_info(&self, token: Address, owner: Address) -> Result<TokenInfo> {
        let erc20 = IERC20::new(token, &self.provider);
        let (balance, decimals, symbol) = self
            .provider
            .multicall()
            .add(erc20.balanceOf(owner))
            .add(erc20.decimals())
            .add(erc20.symbol())
            .aggregate()
            .await?;

        Ok(TokenInfo { balance, decimals, symbol })
    }

    async fn estimate_gas(&self, request: GasEstimate) -> Result<u64> {
        let tx = TransactionRequest::default()
            .from(request.from)
            .to(request.to)
            .input(request.data.into());

        let mut estimate = self.provider.estimate_gas(tx);
        if let Some(overrides) = request.overrides {
            estimate = estimate.overrides(overrides);
        }
        Ok(estimate.await?)
    }
}
