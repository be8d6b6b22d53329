//! Manually advanced clock for deterministic tests and offline replays.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use wallet_core::scheduler::{Clock, ScheduledTask, Scheduler, TimerId};

#[derive(Debug)]
struct VirtualState {
    now: DateTime<Utc>,
    next_id: u64,
    /// Ordered by due time, then by scheduling order.
    queue: BTreeMap<(DateTime<Utc>, u64), ScheduledTask>,
    due_at: HashMap<u64, DateTime<Utc>>,
}

/// Timers never fire on their own; the owner pulls due ones with
/// [`VirtualScheduler::pop_due`].
#[derive(Debug)]
pub struct VirtualScheduler {
    state: Mutex<VirtualState>,
}

impl VirtualScheduler {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(VirtualState {
                now: start,
                next_id: 1,
                queue: BTreeMap::new(),
                due_at: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Removes the earliest timer due at or before `until` and moves the
    /// clock to its due time.
    pub fn pop_due(&self, until: DateTime<Utc>) -> Option<(TimerId, ScheduledTask)> {
        let mut state = self.lock();
        let (&(due, id), _) = state.queue.iter().next()?;
        if due > until {
            return None;
        }
        let task = state.queue.remove(&(due, id))?;
        state.due_at.remove(&id);
        if due > state.now {
            state.now = due;
        }
        Some((TimerId(id), task))
    }

    /// Moves the clock forward. Never moves it backwards.
    pub fn set_now(&self, now: DateTime<Utc>) {
        let mut state = self.lock();
        if now > state.now {
            state.now = now;
        }
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.lock().queue.keys().next().map(|(due, _)| *due)
    }

    pub fn pending_tasks(&self) -> Vec<ScheduledTask> {
        self.lock().queue.values().cloned().collect()
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for VirtualScheduler {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) -> TimerId {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let due = state.now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
        state.queue.insert((due, id), task);
        state.due_at.insert(id, due);
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) {
        let mut state = self.lock();
        if let Some(due) = state.due_at.remove(&id.0) {
            state.queue.remove(&(due, id.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order_and_advances_clock() {
        let start = Utc::now();
        let clock = VirtualScheduler::new(start);
        clock.schedule_after(Duration::from_secs(10), ScheduledTask::InactivityLogout);
        let first = clock.schedule_after(Duration::from_secs(5), ScheduledTask::VerificationPoll);

        let until = start + chrono::Duration::seconds(60);
        let (id, task) = clock.pop_due(until).unwrap();
        assert_eq!(id, first);
        assert_eq!(task, ScheduledTask::VerificationPoll);
        assert_eq!(clock.now(), start + chrono::Duration::seconds(5));

        assert_eq!(clock.pop_due(until).unwrap().1, ScheduledTask::InactivityLogout);
        assert!(clock.pop_due(until).is_none());
    }

    #[test]
    fn test_same_due_time_is_fifo() {
        let clock = VirtualScheduler::default();
        let a = clock.schedule_after(Duration::from_secs(1), ScheduledTask::VerificationPoll);
        let b = clock.schedule_after(Duration::from_secs(1), ScheduledTask::InactivityWarning);
        let until = clock.now() + chrono::Duration::seconds(1);
        assert_eq!(clock.pop_due(until).unwrap().0, a);
        assert_eq!(clock.pop_due(until).unwrap().0, b);
    }

    #[test]
    fn test_cancel_and_not_yet_due() {
        let clock = VirtualScheduler::default();
        let id = clock.schedule_after(Duration::from_secs(30), ScheduledTask::VerificationPoll);
        assert!(clock.pop_due(clock.now()).is_none());
        clock.cancel(id);
        clock.cancel(id);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_clock_never_goes_back() {
        let start = Utc::now();
        let clock = VirtualScheduler::new(start);
        clock.set_now(start - chrono::Duration::seconds(10));
        assert_eq!(clock.now(), start);
    }
}
