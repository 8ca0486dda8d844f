//! In-order, single-consumer queue for "next tick" work.
//!
//! Producers (the ingest path, the recovery loop) enqueue without blocking
//! and without holding the mining lock. One consumer task drains the queue
//! in FIFO order.

use crate::domain::Block;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

/// Work deferred to the next scheduler tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeferredTask {
    /// Relay an accepted block, if the node is synced by then.
    BroadcastBlock(Block),
    /// Ask peers for their block heights.
    RequestPeerHeights,
}

/// Queue handle shared by producers; the receiver is handed out once.
pub struct DeferredQueue {
    sender: UnboundedSender<DeferredTask>,
    receiver: Mutex<Option<UnboundedReceiver<DeferredTask>>>,
}

impl DeferredQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Enqueue a task. Never blocks.
    pub fn schedule(&self, task: DeferredTask) {
        if self.sender.send(task).is_err() {
            warn!("[qc-18] deferred queue consumer is gone, dropping task");
        }
    }

    /// Take the consumer end. Returns `None` after the first call.
    pub fn take_receiver(&self) -> Option<UnboundedReceiver<DeferredTask>> {
        self.receiver.lock().take()
    }
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}
