//! Deferred task queue for "before client response" processing.
//!
//! Grid operations that need to tell the client something do not talk to it
//! directly. They post a task to the grid's [`DeferredQueue`], and the queue
//! is flushed once at the end of the turn, right before the response is
//! produced. Tasks run in the order they were posted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::targets;

/// A unique identifier for a deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A boxed task closure receiving the flush context.
type BoxedTask<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

struct TaskData<C: ?Sized> {
    id: TaskId,
    label: &'static str,
    task: BoxedTask<C>,
}

/// FIFO queue of tasks that run against a context `C` when flushed.
///
/// `C` is usually a trait object for the client-sync collaborator, e.g.
/// `DeferredQueue<dyn ClientSync<T>>`.
pub struct DeferredQueue<C: ?Sized> {
    tasks: VecDeque<TaskData<C>>,
}

impl<C: ?Sized> DeferredQueue<C> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Post a task to run at the next flush.
    ///
    /// `label` names the task in trace output.
    pub fn post<F>(&mut self, label: &'static str, task: F) -> TaskId
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        let id = next_task_id();
        tracing::trace!(target: targets::CLIENT, task = label, id = id.as_u64(), "deferred task posted");
        self.tasks.push_back(TaskData {
            id,
            label,
            task: Box::new(task),
        });
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was found and cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(pos) = self.tasks.iter().position(|t| t.id == id) {
            self.tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Run every task that was pending when the flush started.
    ///
    /// Tasks posted while flushing are kept for the next flush.
    /// Returns the number of tasks processed.
    pub fn flush(&mut self, ctx: &mut C) -> usize {
        let batch = std::mem::take(&mut self.tasks);
        let count = batch.len();
        for task_data in batch {
            tracing::trace!(target: targets::CLIENT, task = task_data.label, "running deferred task");
            (task_data.task)(ctx);
        }
        count
    }
}

impl<C: ?Sized> Default for DeferredQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}
