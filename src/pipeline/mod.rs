//! Transaction-build pipeline.
//!
//! A submission flows through the stages in order:
//!
//! 1. [`PaymentCallResolver`] turns the payment policy into a fee call appended to the batch.
//! 2. [`AuthorizationCoordinator`] decides whether an EIP-7702 authorization must be signed.
//! 3. [`sign_calls`] signs the batch under a nonce key and encodes the `execute` calldata.
//! 4. [`TransactionSubmitter`] sends everything to the relay and returns the task handle.

mod authorization;
pub use authorization::{AuthorizationCoordinator, delegation_designator, is_delegated_to};

mod metrics;
pub use metrics::PipelineMetrics;

mod payment;
pub use payment::{FeePayment, PaymentCallResolver};

mod signer;
pub use signer::{SignedExecution, sign_calls};

mod submitter;
pub use submitter::{Submission, TransactionSubmitter, send_transaction_params, validate_payment};
