//! Smart wallet client.

use crate::{
    account::SmartAccount,
    chain::ChainApi,
    config::ClientConfig,
    error::{RelayApiError, SmartWalletError},
    nonce::DEFAULT_NONCE_KEY,
    oracle::{FeeOracle, HttpFeeOracle},
    pipeline::{
        AuthorizationCoordinator, PaymentCallResolver, PipelineMetrics, Submission,
        TransactionSubmitter, sign_calls, validate_payment,
    },
    response::GelatoResponse,
    rpc::{RelayApi, RelayClient},
    tracker::TaskTracker,
    types::{
        Call, Payment,
        rpc::{
            GetCapabilitiesParams, GetQuoteParams, PrepareCallsParams, PrepareCallsResponse,
            Quote, RelayAuthorization, RelayCapabilities, SendPreparedCallsParams,
        },
    },
};
use alloy::primitives::{Address, ChainId, U256, aliases::U192};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Parameters of [`SmartWalletClient::execute`].
#[derive(Debug, Clone)]
pub struct ExecuteParams {
    /// How the relay is paid.
    pub payment: Payment,
    /// The calls to execute, in order.
    pub calls: Vec<Call>,
    /// The nonce key to sign under. Executions under different keys do not block each other.
    pub nonce_key: U192,
}

impl ExecuteParams {
    /// Creates parameters using the default nonce key.
    pub const fn new(payment: Payment, calls: Vec<Call>) -> Self {
        Self { payment, calls, nonce_key: DEFAULT_NONCE_KEY }
    }

    /// Sets the nonce key.
    pub const fn with_nonce_key(mut self, nonce_key: U192) -> Self {
        self.nonce_key = nonce_key;
        self
    }
}

/// Sends calls from a [`SmartAccount`] through the relay.
#[derive(Debug, Clone)]
pub struct SmartWalletClient {
    account: Arc<dyn SmartAccount>,
    relay: Arc<dyn RelayApi>,
    tracker: TaskTracker,
    payments: PaymentCallResolver,
    authorizations: Arc<AuthorizationCoordinator>,
    submitter: TransactionSubmitter,
}

impl SmartWalletClient {
    /// Creates a client talking to the endpoints in `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: &ClientConfig,
        account: Arc<dyn SmartAccount>,
        chain: Arc<dyn ChainApi>,
    ) -> Result<Self, SmartWalletError> {
        let relay = RelayClient::new(config.relay.url.clone(), config.relay.api_key.clone())?;
        let oracle = HttpFeeOracle::new(config.oracle.url.clone())?;
        Ok(Self::from_parts(
            account,
            chain,
            Arc::new(relay),
            Arc::new(oracle),
            TaskTracker::from_config(&config.tracker)?,
        ))
    }

    /// Creates a client from its collaborators.
    pub fn from_parts(
        account: Arc<dyn SmartAccount>,
        chain: Arc<dyn ChainApi>,
        relay: Arc<dyn RelayApi>,
        oracle: Arc<dyn FeeOracle>,
        tracker: TaskTracker,
    ) -> Self {
        let metrics = Arc::new(PipelineMetrics::default());
        Self {
            account,
            payments: PaymentCallResolver::new(chain.clone(), oracle),
            authorizations: Arc::new(AuthorizationCoordinator::new(chain, metrics.clone())),
            submitter: TransactionSubmitter::new(relay.clone(), tracker.clone(), metrics),
            relay,
            tracker,
        }
    }

    /// The account calls are sent from.
    pub fn account(&self) -> &dyn SmartAccount {
        self.account.as_ref()
    }

    /// The tracker resolving submitted tasks.
    pub const fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Returns the chain id of the connected chain.
    pub async fn chain_id(&self) -> Result<ChainId, SmartWalletError> {
        self.authorizations.chain_id().await
    }

    /// Signs `params.calls` and submits them to the relay.
    ///
    /// Unless sponsored, a call paying the relay fee is appended after the user calls. If the
    /// account relies on an EIP-7702 delegation that is not in place yet, a signed authorization
    /// is attached.
    #[instrument(skip_all, fields(account = %self.account.address()))]
    pub async fn execute(
        &self,
        params: ExecuteParams,
    ) -> Result<GelatoResponse, SmartWalletError> {
        let ExecuteParams { payment, mut calls, nonce_key } = params;
        validate_payment(&payment)?;

        let account = self.account.as_ref();
        let chain_id = self.chain_id().await?;

        if let Some(fee) = self.payments.resolve(&payment, &calls, chain_id, account).await? {
            debug!(token = %fee.token, amount = %fee.amount, "Appending fee payment");
            calls.push(fee.call);
        }

        let authorization_list = self.authorizations.authorization_list(account).await?;
        let signed = sign_calls(account, chain_id, &calls, nonce_key).await?;

        self.submitter
            .submit(
                &payment,
                Submission {
                    chain_id,
                    target: account.address(),
                    data: signed.data,
                    authorization_list,
                },
            )
            .await
    }

    /// Asks the relay to prepare `calls` for signing.
    pub async fn prepare_calls(
        &self,
        calls: Vec<Call>,
        fee_token: Option<Address>,
    ) -> Result<PrepareCallsResponse, SmartWalletError> {
        let params = PrepareCallsParams {
            chain_id: self.chain_id().await?,
            from: self.account.address(),
            calls,
            fee_token,
        };
        Ok(self.relay.prepare_calls(params).await?)
    }

    /// Signs calls prepared with [`Self::prepare_calls`] and submits them.
    pub async fn send_prepared_calls(
        &self,
        prepared: PrepareCallsResponse,
    ) -> Result<GelatoResponse, SmartWalletError> {
        let account = self.account.as_ref();
        let signature = match &prepared.typed_data {
            Some(typed_data) => account.sign_typed_data(typed_data).await,
            None => account.sign_message(prepared.digest.as_slice()).await,
        }
        .map_err(SmartWalletError::account)?;

        let authorization_list = self
            .authorizations
            .authorization_list(account)
            .await?
            .iter()
            .map(RelayAuthorization::from)
            .collect();

        let response = self
            .relay
            .send_prepared_calls(SendPreparedCallsParams {
                context: prepared.context,
                signature,
                authorization_list,
            })
            .await?;

        let task_id = response.task_id.ok_or_else(|| {
            RelayApiError::RelaySubmissionFailed(format!(
                "no task id returned for prepared calls of {}",
                account.address()
            ))
        })?;
        info!(%task_id, "Submitted prepared calls");

        Ok(GelatoResponse::new(task_id, self.tracker.clone()))
    }

    /// Returns the relay capabilities for `chain_ids`.
    pub async fn get_capabilities(
        &self,
        chain_ids: Vec<ChainId>,
    ) -> Result<RelayCapabilities, SmartWalletError> {
        Ok(self.relay.get_capabilities(GetCapabilitiesParams { chain_ids }).await?)
    }

    /// Quotes the fee of an execution using `gas_limit` gas, paid in `fee_token`.
    pub async fn get_quote(
        &self,
        fee_token: Address,
        gas_limit: U256,
    ) -> Result<Quote, SmartWalletError> {
        let params = GetQuoteParams {
            chain_id: self.chain_id().await?,
            fee_token,
            gas_limit,
            gas_limit_l1: U256::ZERO,
        };
        Ok(self.relay.get_quote(params).await?)
    }
}
