//! Task queue adapter.
//!
//! A tube is a named FIFO channel of the external queue service. Workers only
//! see the [`Tube`] capability; [`RedisTube`] talks to a real service and
//! [`MemoryTube`] keeps everything in process.

mod memory;
mod redis_tube;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error_handling::QueueError;

pub use self::memory::MemoryTube;
pub use self::redis_tube::RedisTube;

/// Task payload: string keys to JSON values (`url`, `url_id`, `recheck`, ...).
pub type TaskData = Map<String, Value>;

/// One queue item as handed out by [`Tube::take`].
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Queue-native identity, used by ack and bury
    pub task_id: String,
    /// Payload
    pub data: TaskData,
}

impl Task {
    /// Returns a string field of the payload.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Returns true when the payload carries a truthy flag under `key`.
    pub fn flag(&self, key: &str) -> bool {
        match self.data.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => !s.is_empty(),
            _ => false,
        }
    }
}

/// The four queue operations the workers rely on.
///
/// Ordering and persistence are the queue service's business; a taken task
/// stays invisible to other consumers until it is acked or buried.
#[async_trait]
pub trait Tube: Send + Sync {
    /// Takes the next ready task, waiting at most `timeout`.
    ///
    /// A zero timeout polls without blocking. `Ok(None)` means nothing was
    /// ready in time.
    async fn take(&self, timeout: Duration) -> Result<Option<Task>, QueueError>;

    /// Removes a taken task permanently.
    async fn ack(&self, task: &Task) -> Result<(), QueueError>;

    /// Parks a taken task for later redelivery.
    async fn bury(&self, task: &Task) -> Result<(), QueueError>;

    /// Appends a new task.
    async fn put(&self, data: TaskData) -> Result<(), QueueError>;

    /// Appends a new task that becomes ready after `delay`.
    async fn put_delayed(&self, data: TaskData, delay: Duration) -> Result<(), QueueError> {
        let _ = delay;
        self.put(data).await
    }
}
