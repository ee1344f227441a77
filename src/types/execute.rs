//! ERC-7821 `execute` encoding.

use super::{Call, OpData};
use crate::constants::{BATCH_EXECUTION_MODE, BATCH_WITH_OP_DATA_EXECUTION_MODE};
use alloy::{
    primitives::{B256, Bytes},
    sol,
    sol_types::{Error, SolCall, SolValue},
};

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IERC7821 {
        /// Executes the calls encoded in `executionData` according to `mode`.
        function execute(bytes32 mode, bytes calldata executionData) external payable;

        /// Whether the executor supports `mode`.
        function supportsExecutionMode(bytes32 mode) external view returns (bool);
    }
}

/// A decoded `execute(bytes32,bytes)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// The execution mode.
    pub mode: B256,
    /// The calls, in execution order.
    pub calls: Vec<Call>,
    /// The `opData` blob, for modes that carry one.
    pub op_data: Option<Bytes>,
}

impl Execution {
    /// Creates an execution of `calls`, selecting the mode from the presence of `op_data`.
    pub fn new(calls: Vec<Call>, op_data: Option<&OpData>) -> Self {
        let mode =
            if op_data.is_some() { BATCH_WITH_OP_DATA_EXECUTION_MODE } else { BATCH_EXECUTION_MODE };
        Self { mode, calls, op_data: op_data.map(OpData::encode) }
    }

    /// Encodes the execution data.
    ///
    /// This is `abi.encode(calls)` or `abi.encode(calls, opData)`.
    pub fn execution_data(&self) -> Bytes {
        match &self.op_data {
            Some(op_data) => (self.calls.clone(), op_data.clone()).abi_encode_params().into(),
            None => self.calls.abi_encode().into(),
        }
    }

    /// Encodes the full `execute` calldata.
    pub fn abi_encode(&self) -> Bytes {
        IERC7821::executeCall { mode: self.mode, executionData: self.execution_data() }
            .abi_encode()
            .into()
    }

    /// Decodes `execute` calldata.
    pub fn abi_decode(data: &[u8]) -> Result<Self, Error> {
        let call = IERC7821::executeCall::abi_decode(data)?;
        Self::decode_execution_data(call.mode, &call.executionData)
    }

    /// Decodes execution data for the given mode.
    pub fn decode_execution_data(mode: B256, data: &[u8]) -> Result<Self, Error> {
        if mode == BATCH_WITH_OP_DATA_EXECUTION_MODE {
            let (calls, op_data) = <(Vec<Call>, Bytes)>::abi_decode_params(data)?;
            Ok(Self { mode, calls, op_data: Some(op_data) })
        } else {
            Ok(Self { mode, calls: Call::decode_array(data)?, op_data: None })
        }
    }
}
