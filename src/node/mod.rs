//! Node module: JSON-RPC access and endpoint health monitoring.

mod health;
mod rpc;

pub use health::*;
pub use rpc::*;

use std::time::Duration;
use thiserror::Error;

/// Node access error types.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
