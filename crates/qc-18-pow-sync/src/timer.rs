//! Single-shot, cancellable timer slots.
//!
//! A [`TimerSlot`] holds at most one scheduled task. Arming a slot cancels
//! whatever it held before; cancelling an empty or already-fired slot is a
//! no-op.
//!
//! Arming a slot from inside that slot's own callback aborts the running
//! callback at its next `.await`, so self-rescheduling callbacks rearm as
//! their final step.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// A named slot holding one pending timer task.
pub struct TimerSlot {
    name: &'static str,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl TimerSlot {
    /// Create an empty slot that schedules onto `runtime`.
    pub fn new(name: &'static str, runtime: Handle) -> Self {
        Self {
            name,
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Slot name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancel the current task (if any) and run `task` after `delay`.
    pub fn arm<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        trace!("[qc-18] arming {} timer in {:?}", self.name, delay);
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancel the current task. No-op when nothing is pending.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
    }

    /// Whether a task is scheduled and has not finished.
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
