//! Deferred task queue.
//!
//! Gesture recognition never blocks and never spawns threads. The only form of
//! scheduling it needs is "run this after a delay", most often a zero delay
//! meaning "on the next iteration of the run loop". The owning run loop drains
//! the queue once per tick; every posted task has a cancellable [`TaskId`].
//!
//! Tasks are plain payload values rather than closures so that the owner can
//! execute them with mutable access to its own state.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use horizon_touch_core::DeferredQueue;
//!
//! let now = Instant::now();
//! let mut queue = DeferredQueue::new();
//! let reset = queue.post(now, "reset");
//! let _timer = queue.perform_after_delay(now, Duration::from_millis(500), "long-press");
//!
//! assert!(queue.cancel(reset));
//! assert!(queue.due_tasks(now).is_empty());
//!
//! let later = now + Duration::from_millis(500);
//! let due = queue.due_tasks(later);
//! assert_eq!(queue.take(due[0]), Some("long-press"));
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a deferred task.
    pub struct TaskId;
}

/// Internal task data.
#[derive(Debug)]
struct TaskData<T> {
    /// When this task becomes due.
    due: Instant,
    /// The work to perform.
    payload: T,
}

/// An entry in the queue (min-heap by due time, then by post order).
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: TaskId,
    due: Instant,
    seq: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A queue of delayed, cancellable tasks drained by the run loop.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    /// All pending tasks.
    tasks: SlotMap<TaskId, TaskData<T>>,
    /// Priority queue of due times. Entries of cancelled tasks are skipped lazily.
    queue: BinaryHeap<QueueEntry>,
    /// Post counter, keeps equal due times in FIFO order.
    next_seq: u64,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Post a zero-delay task, due on the next drain.
    pub fn post(&mut self, now: Instant, payload: T) -> TaskId {
        self.perform_after_delay(now, Duration::ZERO, payload)
    }

    /// Post a task that becomes due `delay` after `now`.
    pub fn perform_after_delay(&mut self, now: Instant, delay: Duration, payload: T) -> TaskId {
        let due = now + delay;
        let id = self.tasks.insert(TaskData { due, payload });
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(QueueEntry { id, due, seq });
        tracing::trace!(target: targets::TASK, ?id, ?delay, "task posted");
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let cancelled = self.tasks.remove(id).is_some();
        if cancelled {
            tracing::trace!(target: targets::TASK, ?id, "task cancelled");
        }
        cancelled
    }

    /// Check whether a task is still pending.
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Time until the next pending task is due, if any.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        self.discard_stale();
        self.queue
            .peek()
            .map(|entry| entry.due.saturating_duration_since(now))
    }

    /// Collect the IDs of every task due at `now`, in due order.
    ///
    /// The tasks stay in the queue until [`take`](Self::take) is called, so a
    /// task cancelled by an earlier one in the same batch is never executed.
    /// Tasks posted while the batch is being executed wait for the next drain.
    pub fn due_tasks(&mut self, now: Instant) -> Vec<TaskId> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.peek() {
            if entry.due > now {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if self.tasks.contains_key(entry.id) {
                due.push(entry.id);
            }
        }
        due
    }

    /// Remove a task and return its payload, or `None` if it was cancelled.
    pub fn take(&mut self, id: TaskId) -> Option<T> {
        self.tasks.remove(id).map(|task| task.payload)
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.queue.clear();
    }

    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.tasks.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}
