//! In-memory implementations of the client seams used by unit tests.
#![allow(missing_docs)]

use crate::{
    account::{AccountDescriptor, AuthorizationInfo, SignatureScheme, SmartAccount},
    chain::{ChainApi, GasEstimate, TokenInfo},
    constants::BATCH_WITH_OP_DATA_EXECUTION_MODE,
    error::{OracleError, RelayApiError, SmartWalletError, TrackerError},
    oracle::FeeOracle,
    rpc::RelayApi,
    tracker::{ConnectionSettings, TaskStatusApi, TaskTracker, TaskTrackingConnection},
    types::{
        Call, ClientMessage, Execution, OpData, ServerMessage, TaskId, TaskStatus,
        rpc::{
            GetCapabilitiesParams, GetQuoteParams, PrepareCallsParams, PrepareCallsResponse,
            Quote, RelayCapabilities, SendPreparedCallsParams, SendTransactionParams,
            TaskResponse,
        },
    },
};
use alloy::{
    dyn_abi::TypedData,
    eips::eip7702::{Authorization, SignedAuthorization},
    primitives::{Address, B256, Bytes, ChainId, U256, aliases::U192},
    signers::{Signer, local::PrivateKeySigner},
};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{net::TcpListener, sync::mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use url::Url;

/// Chain state served by [`MockChain`].
#[derive(Debug, Default)]
pub struct ChainState {
    pub chain_id: ChainId,
    pub code: HashMap<Address, Bytes>,
    pub transaction_counts: HashMap<Address, u64>,
    pub native_balances: HashMap<Address, U256>,
    pub tokens: HashMap<(Address, Address), TokenInfo>,
    pub gas: u64,
    pub estimates: Vec<GasEstimate>,
}

#[derive(Debug, Default)]
pub struct MockChain {
    pub state: Mutex<ChainState>,
    pub chain_id_calls: AtomicUsize,
}

impl MockChain {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            state: Mutex::new(ChainState { chain_id, gas: 100_000, ..Default::default() }),
            chain_id_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_code(&self, address: Address, code: Bytes) {
        self.state.lock().unwrap().code.insert(address, code);
    }

    pub fn set_native_balance(&self, address: Address, balance: U256) {
        self.state.lock().unwrap().native_balances.insert(address, balance);
    }

    pub fn set_token(&self, token: Address, owner: Address, info: TokenInfo) {
        self.state.lock().unwrap().tokens.insert((token, owner), info);
    }

    pub fn estimates(&self) -> Vec<GasEstimate> {
        self.state.lock().unwrap().estimates.clone()
    }
}

#[async_trait]
impl ChainApi for MockChain {
    async fn chain_id(&self) -> Result<ChainId, SmartWalletError> {
        self.chain_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, SmartWalletError> {
        Ok(self.state.lock().unwrap().code.get(&address).cloned().unwrap_or_default())
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, SmartWalletError> {
        Ok(self.state.lock().unwrap().transaction_counts.get(&address).copied().unwrap_or_default())
    }

    async fn native_balance(&self, address: Address) -> Result<U256, SmartWalletError> {
        Ok(self.state.lock().unwrap().native_balances.get(&address).copied().unwrap_or_default())
    }

    async fn token_info(&self, token: Address, owner: Address) -> Result<TokenInfo, SmartWalletError> {
        self.state
            .lock()
            .unwrap()
            .tokens
            .get(&(token, owner))
            .cloned()
            .ok_or_else(|| eyre::eyre!("unknown token {token}").into())
    }

    async fn estimate_gas(&self, request: GasEstimate) -> Result<u64, SmartWalletError> {
        let mut state = self.state.lock().unwrap();
        state.estimates.push(request);
        Ok(state.gas)
    }
}

#[derive(Debug)]
pub struct MockOracle {
    pub tokens: Vec<Address>,
    pub fee: U256,
    pub collector: Address,
    pub estimate_calls: AtomicUsize,
}

impl MockOracle {
    pub fn new(tokens: Vec<Address>, fee: U256, collector: Address) -> Self {
        Self { tokens, fee, collector, estimate_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl FeeOracle for MockOracle {
    async fn payment_tokens(&self, _chain_id: ChainId) -> Result<Vec<Address>, OracleError> {
        Ok(self.tokens.clone())
    }

    async fn fee_collector(&self, _chain_id: ChainId) -> Result<Address, OracleError> {
        Ok(self.collector)
    }

    async fn estimate_fee(
        &self,
        _chain_id: ChainId,
        _token: Address,
        _gas_limit: u64,
        _gas_limit_l1: u64,
    ) -> Result<U256, OracleError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fee)
    }
}

#[derive(Debug, Default)]
pub struct MockRelay {
    pub task_id: Option<TaskId>,
    pub error: Option<String>,
    pub sent: Mutex<Vec<SendTransactionParams>>,
}

impl MockRelay {
    pub fn with_task(task_id: &str) -> Self {
        Self { task_id: Some(task_id.into()), ..Default::default() }
    }

    pub fn sent(&self) -> Vec<SendTransactionParams> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayApi for MockRelay {
    async fn prepare_calls(
        &self,
        _params: PrepareCallsParams,
    ) -> Result<PrepareCallsResponse, RelayApiError> {
        Err(RelayApiError::MissingResult { method: "wallet_prepareCalls" })
    }

    async fn send_prepared_calls(
        &self,
        _params: SendPreparedCallsParams,
    ) -> Result<TaskResponse, RelayApiError> {
        Ok(TaskResponse { task_id: self.task_id.clone() })
    }

    async fn send_transaction(
        &self,
        params: SendTransactionParams,
    ) -> Result<TaskResponse, RelayApiError> {
        self.sent.lock().unwrap().push(params);
        if let Some(message) = &self.error {
            return Err(RelayApiError::Rpc {
                method: "wallet_sendTransaction",
                message: message.clone(),
            });
        }
        Ok(TaskResponse { task_id: self.task_id.clone() })
    }

    async fn get_capabilities(
        &self,
        _params: GetCapabilitiesParams,
    ) -> Result<RelayCapabilities, RelayApiError> {
        Ok(RelayCapabilities::default())
    }

    async fn get_quote(&self, _params: GetQuoteParams) -> Result<Quote, RelayApiError> {
        Ok(Quote { fee: U256::ZERO, fee_token: None })
    }
}

/// Serves task statuses from memory. Unknown tasks are reported as not found.
#[derive(Debug, Default)]
pub struct MockStatus {
    pub statuses: Mutex<HashMap<TaskId, TaskStatus>>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockStatus {
    pub fn set(&self, status: TaskStatus) {
        self.statuses.lock().unwrap().insert(status.task_id.clone(), status);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStatusApi for MockStatus {
    async fn task_status(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, TrackerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TrackerError::UnexpectedStatus { task_id: task_id.to_string(), status: 500 });
        }
        Ok(self.statuses.lock().unwrap().get(task_id).cloned())
    }
}

/// An EIP-7702 delegated EOA backed by a local key.
#[derive(Debug)]
pub struct TestAccount {
    pub signer: PrivateKeySigner,
    pub descriptor: AccountDescriptor,
    pub authorization: Option<AuthorizationInfo>,
    pub can_sign_authorization: bool,
    pub nonces: Mutex<HashMap<U192, U256>>,
}

impl TestAccount {
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
            descriptor: AccountDescriptor {
                name: "TestAccount".into(),
                version: "1".into(),
                execution_mode: BATCH_WITH_OP_DATA_EXECUTION_MODE,
                signature_scheme: SignatureScheme::TypedData,
            },
            authorization: None,
            can_sign_authorization: true,
            nonces: Default::default(),
        }
    }

    pub fn delegated_to(delegate: Address) -> Self {
        let mut account = Self::random();
        account.authorization =
            Some(AuthorizationInfo { address: delegate, account: account.signer.address() });
        account
    }

    pub fn with_scheme(mut self, scheme: SignatureScheme) -> Self {
        self.descriptor.signature_scheme = scheme;
        self
    }

    pub fn set_nonce(&self, key: U192, nonce: U256) {
        self.nonces.lock().unwrap().insert(key, nonce);
    }
}

#[async_trait]
impl SmartAccount for TestAccount {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn descriptor(&self) -> &AccountDescriptor {
        &self.descriptor
    }

    fn authorization(&self) -> Option<&AuthorizationInfo> {
        self.authorization.as_ref()
    }

    async fn is_deployed(&self) -> eyre::Result<bool> {
        Ok(self.authorization.is_none())
    }

    async fn get_nonce(&self, key: U192) -> eyre::Result<U256> {
        Ok(self.nonces.lock().unwrap().get(&key).copied().unwrap_or_default())
    }

    fn encode_calls(&self, calls: &[Call], op_data: Option<&OpData>) -> eyre::Result<Bytes> {
        Ok(Execution::new(calls.to_vec(), op_data).abi_encode())
    }

    fn decode_calls(&self, data: &[u8]) -> eyre::Result<Vec<Call>> {
        Ok(Execution::abi_decode(data)?.calls)
    }

    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Bytes> {
        Ok(self.signer.sign_message(message).await?.as_bytes().into())
    }

    async fn sign_typed_data(&self, typed_data: &TypedData) -> eyre::Result<Bytes> {
        let hash = typed_data.eip712_signing_hash()?;
        Ok(self.signer.sign_hash(&hash).await?.as_bytes().into())
    }

    async fn sign_user_operation(&self, hash: B256) -> eyre::Result<Bytes> {
        Ok(self.signer.sign_hash(&hash).await?.as_bytes().into())
    }

    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Option<eyre::Result<SignedAuthorization>> {
        if !self.can_sign_authorization {
            return None;
        }
        let signature = match self.signer.sign_hash(&authorization.signature_hash()).await {
            Ok(signature) => signature,
            Err(err) => return Some(Err(err.into())),
        };
        Some(Ok(authorization.into_signed(signature)))
    }
}

/// A [`TaskTracker`] answering status checks from `status`.
///
/// The socket points at a closed port and is only opened once something subscribes.
pub fn tracker(status: Arc<MockStatus>) -> TaskTracker {
    let url = "ws://127.0.0.1:1".parse().unwrap();
    TaskTracker::new(status, TaskTrackingConnection::spawn(url, ConnectionSettings::default()))
        .with_poll_interval(Duration::from_millis(1))
        .with_max_poll_retries(3)
}

/// Task websocket server accepting a single connection.
///
/// Client messages are forwarded to the returned receiver, strings pushed to the returned sender
/// are sent as text frames.
pub async fn ws_server() -> (Url, mpsc::UnboundedReceiver<ClientMessage>, mpsc::UnboundedSender<String>)
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap()).parse().unwrap();
    let (received_tx, received_rx) = mpsc::unbounded_channel();
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();
        loop {
            tokio::select! {
                message = socket.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        let _ = received_tx.send(serde_json::from_str(text.as_str()).unwrap());
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                },
                Some(text) = outgoing_rx.recv() => {
                    if socket.send(Message::text(text)).await.is_err() {
                        break
                    }
                }
            }
        }
    });

    (url, received_rx, outgoing_tx)
}

/// Starts a task websocket server accepting any number of connections, one at a time.
///
/// Received messages are tagged with the index of their connection. Sending on the returned
/// sender closes the current connection.
pub async fn reconnecting_ws_server()
-> (Url, mpsc::UnboundedReceiver<(usize, ClientMessage)>, mpsc::UnboundedSender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap()).parse().unwrap();
    let (received_tx, received_rx) = mpsc::unbounded_channel();
    let (close_tx, mut close_rx) = mpsc::unbounded_channel::<()>();

    tokio::spawn(async move {
        for index in 0.. {
            let Ok((stream, _)) = listener.accept().await else { break };
            let mut socket = accept_async(stream).await.unwrap();
            loop {
                tokio::select! {
                    message = socket.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            let message = serde_json::from_str(text.as_str()).unwrap();
                            let _ = received_tx.send((index, message));
                        }
                        Some(Ok(_)) => {}
                        _ => break,
                    },
                    Some(()) = close_rx.recv() => {
                        let _ = socket.close(None).await;
                        break
                    }
                }
            }
        }
    });

    (url, received_rx, close_tx)
}

/// Encodes an `update` event for `status`.
pub fn update_event(status: TaskStatus) -> String {
    serde_json::to_string(&ServerMessage::Update(status)).unwrap()
}
