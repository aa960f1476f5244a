//! Supervision for detached cache bookkeeping writes
//!
//! Route registration and dependency persistence run off the request's
//! critical path. They are spawned here instead of being dropped on the
//! floor, so a caller that needs the cache to have converged can wait for
//! them with [`WriteBehind::settle`].

use futures_util::future::join_all;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::warn;

/// Tracks spawned bookkeeping writes
#[derive(Debug, Default)]
pub struct WriteBehind {
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl WriteBehind {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a write onto the runtime without waiting for it
    pub fn spawn<F>(&self, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(write);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every write spawned so far
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("Cache bookkeeping write failed: {}", e);
            }
        }
    }

    /// Writes spawned and not yet reaped
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }
}
