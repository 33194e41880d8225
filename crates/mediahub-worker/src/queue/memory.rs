//! In-process queue for tests and single-node runs.

use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use mediahub_core::result::AppResult;
use mediahub_entity::task::TaskEnvelope;

use super::{Delivery, TaskQueue};

/// [`TaskQueue`] backed by an unbounded channel. Acknowledgements and
/// dead letters are recorded for inspection.
#[derive(Debug)]
pub struct MemoryTaskQueue {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Mutex<mpsc::UnboundedReceiver<Delivery>>,
    next_id: AtomicU64,
    acked: StdMutex<Vec<String>>,
    dead: StdMutex<Vec<(Delivery, String)>>,
}

impl Default for MemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            next_id: AtomicU64::new(1),
            acked: StdMutex::new(Vec::new()),
            dead: StdMutex::new(Vec::new()),
        }
    }

    /// Append a raw payload, bypassing envelope encoding.
    pub fn push_raw(&self, payload: impl Into<String>) -> String {
        let id = format!("{}-0", self.next_id.fetch_add(1, Ordering::Relaxed));
        // The receiver lives in `self`, so the channel is never closed here.
        let _ = self.tx.send(Delivery {
            id: id.clone(),
            payload: payload.into(),
        });
        id
    }

    /// Ids acknowledged so far, in order.
    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Parked entries with their reasons.
    pub fn dead_letters(&self) -> Vec<(Delivery, String)> {
        self.dead.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn publish(&self, envelope: &TaskEnvelope) -> AppResult<()> {
        let payload = serde_json::to_string(envelope)?;
        self.push_raw(payload);
        Ok(())
    }

    async fn receive(&self) -> AppResult<Option<Delivery>> {
        Ok(self.rx.lock().await.try_recv().ok())
    }

    async fn ack(&self, delivery: &Delivery) -> AppResult<()> {
        if let Ok(mut acked) = self.acked.lock() {
            acked.push(delivery.id.clone());
        }
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> AppResult<()> {
        if let Ok(mut dead) = self.dead.lock() {
            dead.push((delivery.clone(), reason.to_string()));
        }
        Ok(())
    }
}
