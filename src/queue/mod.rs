//! Task Queue
//!
//! FIFO queue of pending snapshot tasks with a set-valued admission filter.
//! `Offer` and `Take` may be called from any task concurrently; the
//! admission-set check and the enqueue are atomic with respect to one
//! another.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::model::{SnapshotKey, Task};

struct QueueState {
    pending: VecDeque<Task>,
    admission: HashSet<SnapshotKey>,
    closed: bool,
}

/// De-duplicating, closeable work queue.
///
/// The admission set enforces "first seen by scanner", not "present in
/// queue": a retry re-enqueue (`requeue`) bypasses the admission check
/// entirely, since the key was already admitted when the scanner first
/// discovered it.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                admission: HashSet::new(),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Offer a freshly discovered task. Returns `false` if the key has
    /// already been admitted (queued, in-flight, completed, or abandoned in
    /// this supervisor lifetime) or the queue is closed.
    pub fn offer(&self, task: Task) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return false;
        }
        let key = task.key();
        if !state.admission.insert(key) {
            return false;
        }
        state.pending.push_back(task);
        drop(state);
        self.notify.notify_one();
        true
    }

    /// Re-enqueue a task a worker is retrying. Bypasses the admission
    /// filter: the key was already admitted when first offered.
    ///
    /// A no-op if the queue has been closed; the retry will simply be
    /// rediscovered on the next startup.
    pub fn requeue(&self, task: Task) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.pending.push_back(task);
        drop(state);
        self.notify.notify_one();
    }

    /// Block until a task is available or the queue is closed and drained.
    pub async fn take(&self) -> Option<Task> {
        loop {
            // Register interest *before* checking state, so a notify sent
            // between our check and the await below is not missed.
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().unwrap();
                if let Some(task) = state.pending.pop_front() {
                    return Some(task);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Close the queue to new entries and discard whatever is still
    /// buffered. In-flight tasks already taken by a worker are unaffected;
    /// they are not tracked here.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.pending.clear();
        drop(state);
        self.notify.notify_waiters();
    }

    pub fn size(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    #[cfg(test)]
    fn is_admitted(&self, key: &SnapshotKey) -> bool {
        self.state.lock().unwrap().admission.contains(key)
    }
}
