//! Progress aggregation
//!
//! Every progress update from every worker goes through one
//! [`ProgressAggregator`]. An update is applied to the shared state and its
//! event is broadcast under the same lock, so subscribers observe updates in
//! exactly the order they were applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::types::{AssetKind, Event, ItemId, TaskId};

/// Capacity of the event channel; slow subscribers see `Lagged` past this
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Per-task counters
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskProgress {
    /// Bytes written so far
    pub bytes_done: u64,
    /// Declared content length
    pub total_bytes: Option<u64>,
    /// Task reached its terminal success state
    pub finished: bool,
    /// Failure message, if the task failed
    pub error: Option<String>,
}

impl TaskProgress {
    /// Completion percentage when the length is known
    pub fn percent(&self) -> Option<f32> {
        percent(self.bytes_done, self.total_bytes)
    }
}

/// Per-item counters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemProgress {
    /// Asset type being processed
    pub kind: AssetKind,
    /// Tasks completed (advanced by [`ProgressAggregator::report_done`])
    pub completed: u32,
    /// Tasks in the item
    pub total: u32,
    /// Tasks that failed
    pub failed: u32,
}

/// Point-in-time copy of all counters, for polling presentation layers
#[derive(Clone, Debug, Default)]
pub struct ProgressSnapshot {
    /// Item counters by ID
    pub items: HashMap<ItemId, ItemProgress>,
    /// Task counters by task
    pub tasks: HashMap<TaskId, TaskProgress>,
}

struct ProgressState {
    snapshot: ProgressSnapshot,
    event_tx: broadcast::Sender<Event>,
}

impl ProgressState {
    fn publish(&self, event: Event) {
        // No subscribers is not an error
        self.event_tx.send(event).ok();
    }
}

/// Synchronized progress sink shared by all workers (cheap to clone)
#[derive(Clone)]
pub struct ProgressAggregator {
    state: Arc<Mutex<ProgressState>>,
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressAggregator {
    /// Create an aggregator with its own event channel
    pub fn new() -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(ProgressState {
                snapshot: ProgressSnapshot::default(),
                event_tx,
            })),
        }
    }

    /// Subscribe to the event stream
    ///
    /// Events sent before subscribing are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.lock().event_tx.subscribe()
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().snapshot.clone()
    }

    /// Register an item and the number of tasks it needs
    pub fn begin_item(&self, id: ItemId, kind: AssetKind, total_tasks: u32) {
        let mut state = self.lock();
        state.snapshot.items.insert(
            id,
            ItemProgress {
                kind,
                completed: 0,
                total: total_tasks,
                failed: 0,
            },
        );
        state
            .snapshot
            .tasks
            .retain(|task, _| task.item != id);
        state.publish(Event::ItemStarted {
            id,
            kind,
            total_tasks,
        });
    }

    /// Record `bytes_done` bytes written for `task`
    pub fn report(&self, task: &TaskId, bytes_done: u64, total_bytes: Option<u64>) {
        let mut state = self.lock();
        let entry = state.snapshot.tasks.entry(*task).or_default();
        entry.bytes_done = bytes_done;
        entry.total_bytes = total_bytes;
        state.publish(Event::TaskProgress {
            task: *task,
            bytes_done,
            total_bytes,
            percent: percent(bytes_done, total_bytes),
        });
    }

    /// Mark `task` finished (terminal)
    pub fn finish_task(&self, task: &TaskId) {
        let mut state = self.lock();
        state.snapshot.tasks.entry(*task).or_default().finished = true;
        state.publish(Event::TaskFinished { task: *task });
    }

    /// Mark `task` failed (terminal)
    pub fn fail_task(&self, task: &TaskId, error: impl Into<String>) {
        let error = error.into();
        let mut state = self.lock();
        state.snapshot.tasks.entry(*task).or_default().error = Some(error.clone());
        if let Some(item) = state.snapshot.items.get_mut(&task.item) {
            item.failed += 1;
        }
        state.publish(Event::TaskFailed { task: *task, error });
    }

    /// Advance the item's completed counter by one
    pub fn report_done(&self, id: ItemId) {
        let mut state = self.lock();
        let Some(item) = state.snapshot.items.get_mut(&id) else {
            return;
        };
        item.completed = (item.completed + 1).min(item.total);
        let (completed, total) = (item.completed, item.total);
        state.publish(Event::ItemAdvanced {
            id,
            completed,
            total,
        });
    }

    /// Drop the counters of item `id` and its tasks, then broadcast its
    /// terminal `event`
    ///
    /// Snapshots only ever hold items still in flight, so a long batch does
    /// not accumulate finished items.
    pub fn end_item(&self, id: ItemId, event: Event) {
        let mut state = self.lock();
        state.snapshot.items.remove(&id);
        state.snapshot.tasks.retain(|task, _| task.item != id);
        state.publish(event);
    }

    /// Broadcast a lifecycle event that carries no counter change
    pub fn emit(&self, event: Event) {
        self.lock().publish(event);
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // A panicking holder cannot leave the counters half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn percent(bytes_done: u64, total_bytes: Option<u64>) -> Option<f32> {
    match total_bytes {
        Some(total) if total > 0 => Some((bytes_done as f64 / total as f64 * 100.0) as f32),
        _ => None,
    }
}
