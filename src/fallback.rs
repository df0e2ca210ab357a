//! Degrade-to-sentinel helper for external reads.

use std::fmt::Display;
use std::future::Future;

/// Await `op`; on error log a warning naming `what` and return `sentinel`.
pub async fn or_sentinel<T, E, F>(what: &str, op: F, sentinel: T) -> T
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match op.await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{} failed, using fallback: {}", what, e);
            sentinel
        }
    }
}
