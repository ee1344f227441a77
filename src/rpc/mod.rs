//! # Relay RPC
//!
//! Client side of the relay's `wallet_` namespace.
//!
//! - `wallet_sendTransaction` submits calldata that was already signed by the account.
//! - `wallet_prepareCalls` and `wallet_sendPreparedCalls` let the relay build the payload the
//!   account signs.
//! - `wallet_getCapabilities` and `wallet_getQuote` report supported fee tokens and fees.

mod relay;
pub use relay::{RelayApi, RelayClient};
