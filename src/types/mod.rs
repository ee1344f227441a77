//! Shared primitive types.
mod call;
pub use call::*;

mod erc20;
pub use erc20::*;

mod execute;
pub use execute::*;

mod op_data;
pub use op_data::*;

mod payment;
pub use payment::*;

pub mod rpc;

mod task;
pub use task::*;
