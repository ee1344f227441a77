//! # Smart Wallet
//!
//! Client for sending batched calls from smart accounts through a relay.
//!
//! A [`SmartWalletClient`](client::SmartWalletClient) resolves how the relay is paid, attaches
//! an EIP-7702 authorization when the account is not delegated yet, signs the batch under a
//! two-dimensional nonce and submits it. The returned [`GelatoResponse`](response::GelatoResponse)
//! resolves the relay task to a transaction hash.

pub mod account;
pub mod chain;
pub mod client;
pub mod config;
pub mod constants;
pub mod eip712;
pub mod error;
pub mod nonce;
pub mod oracle;
pub mod pipeline;
pub mod response;
pub mod rpc;
pub mod serde;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod test_utils;
