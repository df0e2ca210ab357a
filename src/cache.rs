//! Single-value TTL cache cells.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

/// A cached value that expires after a fixed TTL.
///
/// The lock is held while a refresh runs, so callers arriving during a
/// refresh wait for its result instead of starting another one.
pub struct TtlCell<T> {
    ttl: Duration,
    slot: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> TtlCell<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &Entry<T>, now: Instant) -> bool {
        now.duration_since(entry.fetched_at) <= self.ttl
    }

    /// Return the fresh value, or run `refresh` and store its result.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if self.is_fresh(entry, Instant::now()) {
                return entry.value.clone();
            }
        }

        let value = refresh().await;
        *slot = Some(Entry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        value
    }

    /// Fallible variant of [`get_or_refresh`](Self::get_or_refresh).
    ///
    /// `force` skips the freshness check. On error the previous entry is kept.
    pub async fn try_get_or_refresh<F, Fut, E>(&self, force: bool, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;
        if !force {
            if let Some(entry) = slot.as_ref() {
                if self.is_fresh(entry, Instant::now()) {
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = refresh().await?;
        *slot = Some(Entry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    /// Current value if it has not expired.
    #[cfg(test)]
    pub async fn peek(&self) -> Option<T> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|entry| self.is_fresh(entry, Instant::now()))
            .map(|entry| entry.value.clone())
    }
}
