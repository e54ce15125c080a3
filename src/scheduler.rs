//! Virtual-clock task scheduler.
//!
//! Single-threaded, cooperative timer queue. Tasks are plain values; the owner
//! pops due tasks and dispatches them itself, which keeps all mutable state in
//! one place and lets tests drive time deterministically.
//!
//! ```
//! use moodtune::scheduler::Scheduler;
//!
//! let mut timers = Scheduler::new();
//! let ping = timers.schedule(100, "ping");
//! timers.schedule(50, "pong");
//! assert!(timers.cancel(ping));
//!
//! assert_eq!(timers.pop_due(200).map(|(_, t)| t), Some("pong"));
//! assert_eq!(timers.now(), 50);
//! assert!(timers.pop_due(200).is_none());
//! ```

use std::collections::BTreeMap;

/// Handle to a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// Timer queue over a virtual millisecond clock.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    /// Keyed by (due time, id) so equal due times fire in scheduling order.
    queue: BTreeMap<(u64, TaskId), T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Schedules `task` to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.insert((self.now.saturating_add(delay_ms), id), task);
        id
    }

    /// Cancels a pending task. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let key = self.queue.keys().find(|(_, task_id)| *task_id == id).copied();
        key.and_then(|key| self.queue.remove(&key)).is_some()
    }

    #[must_use]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.queue.keys().any(|(_, task_id)| *task_id == id)
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Removes the earliest task due at or before `until`, moving the clock to
    /// its due time. Returns `None` when nothing is due by then.
    pub fn pop_due(&mut self, until: u64) -> Option<(TaskId, T)> {
        let due = self.next_due()?;
        if due > until {
            return None;
        }
        let ((due, id), task) = self.queue.pop_first()?;
        self.now = self.now.max(due);
        Some((id, task))
    }

    /// Moves the clock forward without firing anything.
    pub fn advance_clock(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
