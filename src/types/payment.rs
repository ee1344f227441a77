use crate::constants::NATIVE_TOKEN_ADDRESS;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// How the relay is compensated for a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Payment {
    /// Pay the fee in the chain's native currency.
    Native,
    /// Pay the fee in an ERC-20 token accepted by the fee oracle.
    #[serde(rename = "erc20")]
    Erc20 {
        /// The token used to pay.
        token: Address,
    },
    /// The relay absorbs the fee and bills the sponsor's API key.
    Sponsored {
        /// The sponsor API key.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

impl Payment {
    /// Creates a [`Payment::Native`].
    pub const fn native() -> Self {
        Self::Native
    }

    /// Creates a [`Payment::Erc20`].
    pub const fn erc20(token: Address) -> Self {
        Self::Erc20 { token }
    }

    /// Creates a [`Payment::Sponsored`].
    pub fn sponsored(api_key: impl Into<String>) -> Self {
        Self::Sponsored { api_key: Some(api_key.into()) }
    }

    /// The token the fee is paid in, `None` for sponsored payments.
    ///
    /// Native payments use [`NATIVE_TOKEN_ADDRESS`].
    pub const fn fee_token(&self) -> Option<Address> {
        match self {
            Self::Native => Some(NATIVE_TOKEN_ADDRESS),
            Self::Erc20 { token } => Some(*token),
            Self::Sponsored { .. } => None,
        }
    }

    /// The sponsor API key, if this is a sponsored payment with a non-empty key.
    pub fn sponsor_api_key(&self) -> Option<&str> {
        match self {
            Self::Sponsored { api_key } => api_key.as_deref().filter(|key| !key.is_empty()),
            _ => None,
        }
    }

    /// Whether the relay absorbs the fee.
    pub const fn is_sponsored(&self) -> bool {
        matches!(self, Self::Sponsored { .. })
    }
}
