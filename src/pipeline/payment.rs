//! Resolution of the fee payment call.

use super::authorization::{delegation_designator, is_delegated_to};
use crate::{
    account::SmartAccount,
    chain::{ChainApi, GasEstimate},
    constants::{DEFAULT_GAS_LIMIT_L1, MOCK_FEE_AMOUNT, NATIVE_TOKEN_ADDRESS},
    error::{PaymentError, SmartWalletError},
    oracle::FeeOracle,
    types::{Call, IERC20, Payment},
};
use alloy::{
    primitives::{Address, ChainId, U256},
    rpc::types::state::{AccountOverride, StateOverride, StateOverridesBuilder},
    sol_types::SolCall,
};
use std::sync::Arc;
use tracing::{debug, info};

/// The fee a submission pays to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeePayment {
    /// The token the fee is paid in.
    pub token: Address,
    /// The fee amount, in the smallest unit of the token.
    pub amount: U256,
    /// The address receiving the fee.
    pub collector: Address,
    /// The call transferring the fee, appended last to the batch.
    pub call: Call,
}

/// Turns a [`Payment`] into the call that pays the relay.
#[derive(Debug, Clone)]
pub struct PaymentCallResolver {
    chain: Arc<dyn ChainApi>,
    oracle: Arc<dyn FeeOracle>,
}

impl PaymentCallResolver {
    /// Creates a new [`PaymentCallResolver`].
    pub fn new(chain: Arc<dyn ChainApi>, oracle: Arc<dyn FeeOracle>) -> Self {
        Self { chain, oracle }
    }

    /// Resolves the fee payment of `calls`.
    ///
    /// Returns `None` for sponsored payments. Otherwise the account balance is checked against
    /// the estimated fee and the returned [`FeePayment::call`] must be appended to the batch.
    pub async fn resolve(
        &self,
        payment: &Payment,
        calls: &[Call],
        chain_id: ChainId,
        account: &dyn SmartAccount,
    ) -> Result<Option<FeePayment>, SmartWalletError> {
        let token = match payment {
            Payment::Sponsored { .. } => return Ok(None),
            Payment::Native => None,
            Payment::Erc20 { token } => Some(*token),
        };
        let owner = account.address();

        let (fee_token, available) = match token {
            Some(token) => {
                let accepted = self.oracle.payment_tokens(chain_id).await?;
                if !accepted.contains(&token) {
                    return Err(PaymentError::UnsupportedPaymentToken { token, chain_id }.into());
                }
                let info = self.chain.token_info(token, owner).await?;
                debug!(
                    %token,
                    symbol = %info.symbol,
                    decimals = info.decimals,
                    balance = %info.balance,
                    "Fetched fee token"
                );
                (token, info.balance)
            }
            None => (NATIVE_TOKEN_ADDRESS, self.chain.native_balance(owner).await?),
        };

        let collector = self.oracle.fee_collector(chain_id).await?;
        let gas_limit = self.estimate_gas(calls, token, collector, account).await?;
        let amount = self
            .oracle
            .estimate_fee(chain_id, fee_token, gas_limit, DEFAULT_GAS_LIMIT_L1)
            .await?;

        if available < amount {
            return Err(PaymentError::insufficient_balance(amount, available).into());
        }

        info!(%owner, %fee_token, %amount, gas_limit, "Resolved fee payment");
        let call = fee_call(token, collector, amount);
        Ok(Some(FeePayment { token: fee_token, amount, collector, call }))
    }

    /// Estimates the gas of `calls` followed by a mock fee transfer.
    ///
    /// Accounts relying on a delegation that is not in place yet are estimated with the
    /// delegation designator etched into their code.
    async fn estimate_gas(
        &self,
        calls: &[Call],
        token: Option<Address>,
        collector: Address,
        account: &dyn SmartAccount,
    ) -> Result<u64, SmartWalletError> {
        let address = account.address();
        let mut batch = calls.to_vec();
        batch.push(fee_call(token, collector, U256::from(MOCK_FEE_AMOUNT)));
        let data = account.encode_calls(&batch, None).map_err(SmartWalletError::account)?;

        let overrides = match account.authorization() {
            Some(info) => self.delegation_override(info.account, info.address).await?,
            None => None,
        };

        self.chain.estimate_gas(GasEstimate { from: address, to: address, data, overrides }).await
    }

    async fn delegation_override(
        &self,
        authority: Address,
        delegate: Address,
    ) -> Result<Option<StateOverride>, SmartWalletError> {
        let code = self.chain.get_code(authority).await?;
        if is_delegated_to(&code, delegate) {
            return Ok(None);
        }
        Ok(Some(
            StateOverridesBuilder::default()
                .append(
                    authority,
                    AccountOverride::default().with_code(delegation_designator(delegate)),
                )
                .build(),
        ))
    }
}

/// Returns the call paying `amount` of `token` to `collector`.
///
/// `None` pays in the native currency.
fn fee_call(token: Option<Address>, collector: Address, amount: U256) -> Call {
    match token {
        Some(token) => Call::new(token)
            .with_data(IERC20::transferCall { to: collector, amount }.abi_encode()),
        None => Call::new(collector).with_value(amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::TokenInfo,
        test_utils::{MockChain, MockOracle, TestAccount},
    };
    use alloy::primitives::address;
    use std::sync::atomic::Ordering;

    const USDC: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
    const COLLECTOR: Address = address!("0x3AC05161b76a35c1c28dC99Aa01BEd7B24cEA3bf");
    const DELEGATE: Address = address!("0x00000000000000000000000000000000DeaDBeef");

    fn resolver(
        chain: &Arc<MockChain>,
        oracle: MockOracle,
    ) -> (PaymentCallResolver, Arc<MockOracle>) {
        let oracle = Arc::new(oracle);
        (PaymentCallResolver::new(chain.clone(), oracle.clone()), oracle)
    }

    fn usdc(balance: u64) -> TokenInfo {
        TokenInfo { balance: U256::from(balance), decimals: 6, symbol: "USDC".into() }
    }

    #[tokio::test]
    async fn sponsored() {
        let chain = Arc::new(MockChain::new(1));
        let (resolver, oracle) = resolver(&chain, MockOracle::new(vec![], U256::ZERO, COLLECTOR));
        let account = TestAccount::random();

        let fee = resolver.resolve(&Payment::sponsored("key"), &[], 1, &account).await.unwrap();
        assert!(fee.is_none());
        assert_eq!(oracle.estimate_calls.load(Ordering::SeqCst), 0);
        assert!(chain.estimates().is_empty());
    }

    #[tokio::test]
    async fn erc20() {
        let chain = Arc::new(MockChain::new(8453));
        let account = TestAccount::random();
        chain.set_token(USDC, account.address(), usdc(1_000_000));
        let (resolver, _) =
            resolver(&chain, MockOracle::new(vec![USDC], U256::from(25_000), COLLECTOR));

        let fee = resolver
            .resolve(&Payment::erc20(USDC), &[Call::new(Address::ZERO)], 8453, &account)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fee.amount, U256::from(25_000));
        assert_eq!(fee.call.to, USDC);
        assert_eq!(fee.call.value, U256::ZERO);
        let transfer = IERC20::transferCall::abi_decode(&fee.call.data).unwrap();
        assert_eq!((transfer.to, transfer.amount), (COLLECTOR, U256::from(25_000)));

        // The dry run carries the mock fee as the last call.
        let estimate = chain.estimates().pop().unwrap();
        let batch = account.decode_calls(&estimate.data).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].to, USDC);
        assert_eq!((estimate.from, estimate.to), (account.address(), account.address()));
        assert!(estimate.overrides.is_none());
    }

    #[tokio::test]
    async fn unsupported_token() {
        let chain = Arc::new(MockChain::new(1));
        let account = TestAccount::random();
        let (resolver, oracle) =
            resolver(&chain, MockOracle::new(vec![], U256::from(1), COLLECTOR));

        let err = resolver.resolve(&Payment::erc20(USDC), &[], 1, &account).await.unwrap_err();
        assert!(matches!(
            err,
            SmartWalletError::Payment(PaymentError::UnsupportedPaymentToken { token, chain_id: 1 })
                if token == USDC
        ));
        assert_eq!(oracle.estimate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn insufficient_erc20_balance() {
        let chain = Arc::new(MockChain::new(1));
        let account = TestAccount::random();
        chain.set_token(USDC, account.address(), usdc(10));
        let (resolver, _) =
            resolver(&chain, MockOracle::new(vec![USDC], U256::from(25), COLLECTOR));

        let err = resolver.resolve(&Payment::erc20(USDC), &[], 1, &account).await.unwrap_err();
        let SmartWalletError::Payment(PaymentError::InsufficientBalance {
            required,
            available,
            deficit,
        }) = err
        else {
            panic!("expected insufficient balance")
        };
        assert_eq!(
            (required, available, deficit),
            (U256::from(25), U256::from(10), U256::from(15))
        );
    }

    #[tokio::test]
    async fn native() {
        let chain = Arc::new(MockChain::new(1));
        let account = TestAccount::delegated_to(DELEGATE);
        chain.set_native_balance(account.address(), U256::from(1_000));
        let (resolver, _) = resolver(&chain, MockOracle::new(vec![], U256::from(300), COLLECTOR));

        let fee = resolver.resolve(&Payment::native(), &[], 1, &account).await.unwrap().unwrap();
        assert_eq!(fee.token, NATIVE_TOKEN_ADDRESS);
        assert_eq!(fee.call, Call::new(COLLECTOR).with_value(U256::from(300)));

        // Not delegated yet, so the estimate etches the designator.
        let overrides = chain.estimates().pop().unwrap().overrides.unwrap();
        let code = overrides.get(&account.address()).unwrap().code.clone().unwrap();
        assert_eq!(code, delegation_designator(DELEGATE));
    }

    #[tokio::test]
    async fn insufficient_native_balance() {
        let chain = Arc::new(MockChain::new(1));
        let account = TestAccount::random();
        let (resolver, _) = resolver(&chain, MockOracle::new(vec![], U256::from(300), COLLECTOR));

        let err = resolver.resolve(&Payment::native(), &[], 1, &account).await.unwrap_err();
        assert!(matches!(err, SmartWalletError::Payment(PaymentError::InsufficientBalance { .. })));
    }
}
