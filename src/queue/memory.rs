//! In-process tube.
//!
//! Backs tests and local runs. Keeps acked and buried ids around so callers
//! can inspect what happened to each task.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::{Task, TaskData, Tube};
use crate::error_handling::QueueError;

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    ready: VecDeque<Task>,
    delayed: Vec<(Instant, Task)>,
    /// Taken tasks with the instant they return to `ready`, if any
    taken: HashMap<String, (Option<Instant>, Task)>,
    acked: Vec<String>,
    buried: Vec<Task>,
}

impl MemoryState {
    /// Moves due delayed tasks and expired taken tasks to `ready`.
    fn promote_due(&mut self) {
        let now = Instant::now();
        let (due, pending): (Vec<_>, Vec<_>) =
            self.delayed.drain(..).partition(|(at, _)| *at <= now);
        self.delayed = pending;
        self.ready.extend(due.into_iter().map(|(_, task)| task));

        let expired: Vec<String> = self
            .taken
            .iter()
            .filter(|(_, (deadline, _))| deadline.is_some_and(|at| at <= now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            if let Some((_, task)) = self.taken.remove(&id) {
                debug!("Task {} not finished in time, back to ready", id);
                self.ready.push_back(task);
            }
        }
    }

    /// Earliest instant at which a delayed or taken task becomes ready.
    fn next_due(&self) -> Option<Instant> {
        let delayed = self.delayed.iter().map(|(at, _)| *at);
        let taken = self.taken.values().filter_map(|(deadline, _)| *deadline);
        delayed.chain(taken).min()
    }

    fn next_task(&mut self, data: TaskData) -> Task {
        self.next_id += 1;
        Task {
            task_id: self.next_id.to_string(),
            data,
        }
    }
}

/// FIFO tube held in memory.
///
/// Without a time-to-run a taken task stays taken until it is acked or
/// buried; with one it returns to the ready queue once the time runs out.
#[derive(Default)]
pub struct MemoryTube {
    state: Mutex<MemoryState>,
    available: Notify,
    ttr: Option<Duration>,
}

impl MemoryTube {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tube that redelivers tasks not acked or buried within `ttr`.
    pub fn with_ttr(ttr: Duration) -> Self {
        Self {
            ttr: Some(ttr),
            ..Self::default()
        }
    }

    /// Builds a tube preloaded with `items`, in order.
    pub fn with_tasks(items: impl IntoIterator<Item = TaskData>) -> Self {
        let tube = Self::new();
        {
            let mut state = tube.lock();
            for data in items {
                let task = state.next_task(data);
                state.ready.push_back(task);
            }
        }
        tube
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the queue half-updated
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Payloads of ready and delayed tasks, ready ones first.
    pub fn pending(&self) -> Vec<TaskData> {
        let state = self.lock();
        state
            .ready
            .iter()
            .chain(state.delayed.iter().map(|(_, task)| task))
            .map(|task| task.data.clone())
            .collect()
    }

    /// Ids of acked tasks, in ack order.
    pub fn acked(&self) -> Vec<String> {
        self.lock().acked.clone()
    }

    /// Buried tasks, in bury order.
    pub fn buried(&self) -> Vec<Task> {
        self.lock().buried.clone()
    }

    /// Number of tasks taken but not yet acked or buried.
    pub fn taken_count(&self) -> usize {
        self.lock().taken.len()
    }
}

#[async_trait]
impl Tube for MemoryTube {
    async fn take(&self, timeout: Duration) -> Result<Option<Task>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            let wake_at = {
                let mut state = self.lock();
                state.promote_due();
                if let Some(task) = state.ready.pop_front() {
                    let expires = self.ttr.map(|ttr| Instant::now() + ttr);
                    state
                        .taken
                        .insert(task.task_id.clone(), (expires, task.clone()));
                    return Ok(Some(task));
                }
                state.next_due().map_or(deadline, |due| due.min(deadline))
            };

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let wait = wake_at.saturating_duration_since(now);
            let _ = tokio::time::timeout(wait, self.available.notified()).await;
        }
    }

    async fn ack(&self, task: &Task) -> Result<(), QueueError> {
        let mut state = self.lock();
        match state.taken.remove(&task.task_id) {
            Some(_) => {
                state.acked.push(task.task_id.clone());
                Ok(())
            }
            None => Err(QueueError::UnknownTask(task.task_id.clone())),
        }
    }

    async fn bury(&self, task: &Task) -> Result<(), QueueError> {
        let mut state = self.lock();
        match state.taken.remove(&task.task_id) {
            Some((_, taken)) => {
                state.buried.push(taken);
                Ok(())
            }
            None => Err(QueueError::UnknownTask(task.task_id.clone())),
        }
    }

    async fn put(&self, data: TaskData) -> Result<(), QueueError> {
        {
            let mut state = self.lock();
            let task = state.next_task(data);
            state.ready.push_back(task);
        }
        self.available.notify_one();
        Ok(())
    }

    async fn put_delayed(&self, data: TaskData, delay: Duration) -> Result<(), QueueError> {
        {
            let mut state = self.lock();
            let task = state.next_task(data);
            state.delayed.push((Instant::now() + delay, task));
        }
        // A blocked take recomputes when to wake up
        self.available.notify_one();
        Ok(())
    }
}
