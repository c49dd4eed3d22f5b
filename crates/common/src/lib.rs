//! Shared plumbing for the token bridge crates: logging setup and the
//! backoff/polling helpers every cross-chain wait goes through.

pub mod logging;
pub mod retry;

pub use retry::{Cancelled, RetryConfig, Transient, WaitError};
pub use tokio_util::sync::CancellationToken;
