//! Real timers on the tokio runtime.
//!
//! Each timer is a spawned sleep; when it elapses the task is sent over an
//! unbounded channel to whoever owns the engine, so state is only ever
//! mutated from that single consumer.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use wallet_core::scheduler::{Clock, ScheduledTask, Scheduler, TimerId};

#[derive(Debug, Clone, PartialEq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub task: ScheduledTask,
}

type Handles = Arc<Mutex<HashMap<u64, JoinHandle<()>>>>;

/// Must be used from within a tokio runtime.
pub struct TokioScheduler {
    origin_wall: DateTime<Utc>,
    origin: Instant,
    next_id: AtomicU64,
    handles: Handles,
    sender: mpsc::UnboundedSender<FiredTimer>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FiredTimer>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            origin_wall: Utc::now(),
            origin: Instant::now(),
            next_id: AtomicU64::new(1),
            handles: Arc::new(Mutex::new(HashMap::new())),
            sender,
        };
        (scheduler, receiver)
    }

    fn lock(handles: &Handles) -> MutexGuard<'_, HashMap<u64, JoinHandle<()>>> {
        handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn active_timers(&self) -> usize {
        Self::lock(&self.handles).len()
    }
}

impl Clock for TokioScheduler {
    /// Wall time at creation plus tokio's monotonic elapsed time, so a
    /// paused test runtime moves this clock too.
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin_wall + elapsed
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) -> TimerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let sender = self.sender.clone();
        let handles = Arc::clone(&self.handles);

        // Hold the lock across spawn so the task cannot finish and try to
        // remove its handle before it has been inserted.
        let mut guard = Self::lock(&self.handles);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            Self::lock(&handles).remove(&id);
            if sender.send(FiredTimer { id: TimerId(id), task }).is_err() {
                tracing::debug!("[Scheduler] Timer {} fired after receiver closed", id);
            }
        });
        guard.insert(id, handle);
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) {
        if let Some(handle) = Self::lock(&self.handles).remove(&id.0) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in Self::lock(&self.handles).drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let start = scheduler.now();
        let id = scheduler.schedule_after(Duration::from_secs(15), ScheduledTask::VerificationPoll);

        let timer = fired.recv().await.unwrap();
        assert_eq!(timer.id, id);
        assert_eq!(timer.task, ScheduledTask::VerificationPoll);
        assert!(scheduler.now() - start >= chrono::Duration::seconds(15));
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let cancelled =
            scheduler.schedule_after(Duration::from_secs(1), ScheduledTask::InactivityWarning);
        let kept = scheduler.schedule_after(Duration::from_secs(2), ScheduledTask::InactivityLogout);
        scheduler.cancel(cancelled);

        let timer = fired.recv().await.unwrap();
        assert_eq!(timer.id, kept);
    }
}
