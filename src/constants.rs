//! Client constants.

use alloy::primitives::{Address, B256, address, b256};
use std::time::Duration;

/// Address used by the relay and fee oracle to denote the chain's native currency.
pub const NATIVE_TOKEN_ADDRESS: Address = address!("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// ERC-7821 execution mode for a plain batch of calls.
///
/// The executor accepts `abi.encode(calls)` as execution data in this mode.
pub const BATCH_EXECUTION_MODE: B256 =
    b256!("0x0100000000000000000000000000000000000000000000000000000000000000");

/// ERC-7821 execution mode for a batch of calls carrying `opData`.
///
/// The executor accepts `abi.encode(calls, opData)` as execution data in this mode.
pub const BATCH_WITH_OP_DATA_EXECUTION_MODE: B256 =
    b256!("0x0100000000007821000100000000000000000000000000000000000000000000");

/// Amount used for the placeholder fee call when estimating execution gas.
///
/// The placeholder accounts for the calldata and execution cost of the real fee call, whose
/// amount is only known after the estimate.
pub const MOCK_FEE_AMOUNT: u64 = 1;

/// L1 gas limit passed to the fee oracle.
pub const DEFAULT_GAS_LIMIT_L1: u64 = 0;

/// Maximum time to wait for the task WebSocket to connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before reconnecting a closed task WebSocket.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between task status polls once the WebSocket path failed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum number of task status polls before giving up.
pub const DEFAULT_MAX_POLL_RETRIES: u32 = 60;

/// Timeout applied to every HTTP request issued by the client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the relay API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// The production relay endpoint.
pub const DEFAULT_RELAY_URL: &str = "https://api.gelato.digital/smartwallet";

/// The production fee oracle endpoint.
pub const DEFAULT_ORACLE_URL: &str = "https://api.gelato.digital";

/// The production task status endpoint.
pub const DEFAULT_STATUS_URL: &str = "https://api.gelato.digital";

/// The production task WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://api.gelato.digital/tasks/ws/status";
