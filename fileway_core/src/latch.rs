//! A one-shot, level-triggered signal with bounded-wait semantics.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// One-shot synchronization primitive used to rendezvous a sender's `ping`
/// with a receiver's arrival.
///
/// Starts locked. `unlock()` is idempotent and wakes every waiter; once
/// unlocked, every subsequent `wait()` returns `true` immediately.
#[derive(Debug, Clone)]
pub struct Latch {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    unlocked: AtomicBool,
    notify: Notify,
}

impl Latch {
    /// Creates a new, locked latch.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                unlocked: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Releases the latch. The first call wakes all current and future
    /// waiters; subsequent calls are no-ops.
    pub fn unlock(&self) {
        if self
            .inner
            .unlocked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.notify.notify_waiters();
        }
    }

    /// Blocks until the latch is unlocked or `timeout` elapses. Returns
    /// `true` if the latch was (or became) unlocked, `false` on timeout.
    pub async fn wait(&self, timeout: Duration) -> bool {
        if self.inner.unlocked.load(Ordering::SeqCst) {
            return true;
        }

        // Register for notification before re-checking the flag so an
        // unlock() racing with this call can't be missed between the
        // load above and the wait below.
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.inner.unlocked.load(Ordering::SeqCst) {
            return true;
        }

        matches!(tokio::time::timeout(timeout, notified).await, Ok(())) || self.is_unlocked()
    }

    /// Non-blocking check of current state.
    pub fn is_unlocked(&self) -> bool {
        self.inner.unlocked.load(Ordering::SeqCst)
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_times_out_without_unlock() {
        let latch = Latch::new();
        let fired = latch.wait(Duration::from_millis(50)).await;
        assert!(!fired);
    }

    #[tokio::test]
    async fn wait_returns_true_after_unlock() {
        let latch = Latch::new();
        latch.unlock();
        assert!(latch.wait(Duration::from_millis(10)).await);
        // Subsequent waits return true immediately, forever.
        assert!(latch.wait(Duration::from_millis(0)).await);
    }

    #[tokio::test]
    async fn unlock_is_idempotent() {
        let latch = Latch::new();
        latch.unlock();
        latch.unlock();
        assert!(latch.is_unlocked());
    }

    #[tokio::test]
    async fn concurrent_waiter_is_woken_by_unlock() {
        let latch = Latch::new();
        let waiter = {
            let latch = latch.clone();
            tokio::spawn(async move { latch.wait(Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        latch.unlock();

        let fired = waiter.await.unwrap();
        assert!(fired);
    }
}
