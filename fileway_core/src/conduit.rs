//! Per-transfer state: identity, metadata, chunk plan, and the rendezvous
//! between a single sender and a single receiver.
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::chunk_plan::{build_chunk_plan, text_chunk_plan};
use crate::config::OFFER_TIMEOUT;
use crate::errors::ConduitError;
use crate::id::gen_random_string;
use crate::latch::Latch;

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_millis() as i64
}

/// A single pending or in-flight transfer.
///
/// Constructed by [`crate::ConduitSet::new_conduit`]; never constructed
/// directly by handler code.
pub struct Conduit {
    pub id: String,
    pub is_text: bool,
    pub filename: String,
    pub size: u64,
    pub chunk_plan: Vec<u64>,

    secret: String,
    sender: mpsc::Sender<Bytes>,
    receiver: tokio::sync::Mutex<Option<mpsc::Receiver<Bytes>>>,

    last_accessed: AtomicI64,
    download_started: AtomicBool,
    pub latch: Latch,
}

impl Conduit {
    pub(crate) fn new(
        is_text: bool,
        filename: String,
        size: u64,
        secret: String,
        chunk_ceiling: u64,
        buffer_queue_size: usize,
        id_length: usize,
    ) -> Self {
        let queue_depth = if is_text { 1 } else { buffer_queue_size };
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));

        let chunk_plan = if is_text {
            text_chunk_plan(size)
        } else {
            build_chunk_plan(size, chunk_ceiling)
        };

        let conduit = Self {
            id: gen_random_string(id_length),
            is_text,
            filename,
            size,
            chunk_plan,
            secret,
            sender,
            receiver: tokio::sync::Mutex::new(Some(receiver)),
            last_accessed: AtomicI64::new(0),
            download_started: AtomicBool::new(false),
            latch: Latch::new(),
        };
        conduit.touch();
        conduit
    }

    /// Updates `last_accessed` to the current time. Called by every
    /// operation below.
    fn touch(&self) {
        self.last_accessed.store(now_millis(), Ordering::SeqCst);
    }

    /// Returns `true` if `candidate` does not match this conduit's secret.
    pub fn is_upload_secret_wrong(&self, candidate: &str) -> bool {
        self.secret != candidate
    }

    /// Returns `true` if `last_accessed` is strictly older than `cutoff_ms`.
    pub fn was_accessed_before(&self, cutoff_ms: i64) -> bool {
        self.last_accessed.load(Ordering::SeqCst) < cutoff_ms
    }

    pub fn download_started(&self) -> bool {
        self.download_started.load(Ordering::SeqCst)
    }

    /// Admits a receiver. Succeeds exactly once per conduit: the flip of
    /// `download_started` and the latch release are atomic with respect to
    /// other concurrent callers.
    pub fn download(&self) -> Result<(), ConduitError> {
        self.touch();
        if self
            .download_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ConduitError::Gone);
        }
        self.latch.unlock();
        Ok(())
    }

    /// Enqueues one chunk for the receiver. Blocks up to 30s for queue
    /// space, then fails with [`ConduitError::UploadTimeout`].
    pub async fn offer(&self, content: Bytes) -> Result<(), ConduitError> {
        self.touch();
        match tokio::time::timeout(OFFER_TIMEOUT, self.sender.send(content)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ConduitError::UploadTimeout), // receiver dropped the channel
            Err(_) => Err(ConduitError::UploadTimeout),
        }
    }

    /// Takes ownership of the receiving half of the chunk channel. Can only
    /// succeed once; the drain loop in the `ddl` handler calls this right
    /// after a successful [`Conduit::download`].
    pub async fn take_receiver(&self) -> Option<mpsc::Receiver<Bytes>> {
        self.receiver.lock().await.take()
    }

    /// Unblocks any `ping` waiter without admitting a receiver. Used by the
    /// stale sweeper and by explicit cleanup so blocked waiters observe the
    /// conduit's removal promptly.
    pub(crate) fn force_unlock(&self) {
        self.latch.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(size: u64) -> Conduit {
        Conduit::new(false, "a.bin".into(), size, "s3cret".into(), 4 * 1024 * 1024, 4, 33)
    }

    #[test]
    fn id_has_requested_length() {
        let c = make(10);
        assert_eq!(c.id.len(), 33);
    }

    #[test]
    fn secret_check() {
        let c = make(10);
        assert!(c.is_upload_secret_wrong("wrong"));
        assert!(!c.is_upload_secret_wrong("s3cret"));
    }

    #[test]
    fn download_succeeds_once_then_returns_gone() {
        let c = make(10);
        assert!(c.download().is_ok());
        assert_eq!(c.download().unwrap_err(), ConduitError::Gone);
        assert!(c.download_started());
    }

    #[test]
    fn text_conduit_forces_single_chunk_and_queue_depth_one() {
        let c = Conduit::new(true, "t.txt".into(), 50_000, "s".into(), 4096, 4, 33);
        assert_eq!(c.chunk_plan, vec![50_000]);
    }

    #[tokio::test]
    async fn offer_then_drain_preserves_fifo_order() {
        let c = make(6);
        c.offer(Bytes::from_static(b"AAA")).await.unwrap();
        c.offer(Bytes::from_static(b"BBB")).await.unwrap();
        let mut rx = c.take_receiver().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"AAA"));
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"BBB"));
    }

    #[tokio::test]
    async fn take_receiver_only_succeeds_once() {
        let c = make(1);
        assert!(c.take_receiver().await.is_some());
        assert!(c.take_receiver().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn offer_times_out_when_queue_stays_full() {
        let c = Conduit::new(false, "a.bin".into(), 10, "s".into(), 4 * 1024 * 1024, 1, 33);
        // fill the single-slot queue; nobody drains it.
        c.offer(Bytes::from_static(b"x")).await.unwrap();

        let offer = c.offer(Bytes::from_static(b"y"));
        tokio::pin!(offer);

        tokio::time::advance(OFFER_TIMEOUT + std::time::Duration::from_millis(1)).await;
        assert_eq!(offer.await.unwrap_err(), ConduitError::UploadTimeout);
    }
}
