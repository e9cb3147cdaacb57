//! Tracking of bulk imports still running in the background
//!
//! Imports run detached from the request that started them so a dropped
//! connection never stops a batch halfway. Shutdown waits on the tracker
//! before the process exits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    active: AtomicUsize,
    idle: Notify,
}

/// Counts imports in flight
#[derive(Debug, Clone, Default)]
pub struct ImportTracker {
    inner: Arc<Inner>,
}

impl ImportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an import; it counts as running until the guard is dropped
    pub fn start(&self) -> ImportGuard {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ImportGuard {
            inner: self.inner.clone(),
        }
    }

    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Resolve once no import is running
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.inner.idle.notified();
            if self.active() == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Held by a running import
#[derive(Debug)]
pub struct ImportGuard {
    inner: Arc<Inner>,
}

impl Drop for ImportGuard {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
