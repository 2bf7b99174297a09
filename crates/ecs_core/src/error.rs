//! Caller-visible failure taxonomy.
//!
//! Id-space exhaustion is deliberately not a variant here: it is fatal and
//! unrecoverable by contract (see crate-level docs), so it is reported via
//! `tracing::error!` and the process is terminated instead of being handed
//! back as a `Result` a caller could mistakenly retry.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },
}

impl EcsError {
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange { index, len }
    }
}
