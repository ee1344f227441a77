//! Call type used on ERC-7821 batch executors.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::{Error, SolValue},
};
use serde::{Deserialize, Serialize};

sol! {
    /// A call executed by the smart account.
    ///
    /// Missing `value` and `data` default to zero and empty calldata.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Call {
        /// The call target.
        address to;
        /// Amount of native value to send to the target.
        uint256 value;
        /// The calldata bytes.
        bytes data;
    }
}

impl Call {
    /// Creates a call to `to` without value or calldata.
    pub fn new(to: Address) -> Self {
        Self { to, value: U256::ZERO, data: Bytes::new() }
    }

    /// Sets the calldata of the call.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Sets the native value of the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Helper method to decode an array of `Call[]` into `Vec<Call>`.
    pub fn decode_array(data: &[u8]) -> Result<Vec<Self>, Error> {
        <Vec<Self>>::abi_decode(data)
    }
}
