//! Redis-backed tube.
//!
//! Key layout under `q{space}:{tube}`:
//! - `:data` hash of task id to JSON payload
//! - `:ready` list of ready ids (pushed left, taken right)
//! - `:taken` sorted set of held ids scored by their time-to-run deadline
//! - `:buried` list of parked ids
//! - `:delayed` sorted set of ids scored by their due time
//!
//! Scores are epoch millis. A taken id whose deadline has passed goes back to
//! `:ready`, so a task held by a killed worker, or one whose ack was lost, is
//! delivered again.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use redis::aio::MultiplexedConnection;
use redis::{Client, Script};

use super::{Task, TaskData, Tube};
use crate::error_handling::QueueError;

/// Pause between polls while a take waits for a ready task.
const TAKE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Requeues due delayed ids and expired taken ids, then claims one ready id.
///
/// KEYS: ready, delayed, taken. ARGV: now, deadline for the claimed id.
const TAKE_SCRIPT: &str = r"
local now = tonumber(ARGV[1])
for _, key in ipairs({KEYS[2], KEYS[3]}) do
    for _, id in ipairs(redis.call('ZRANGEBYSCORE', key, '-inf', now)) do
        redis.call('ZREM', key, id)
        redis.call('LPUSH', KEYS[1], id)
    end
end
local id = redis.call('RPOP', KEYS[1])
if not id then
    return false
end
redis.call('ZADD', KEYS[3], ARGV[2], id)
return id
";

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Tube stored in a Redis instance.
pub struct RedisTube {
    conn: MultiplexedConnection,
    prefix: String,
    ttr: Duration,
    take_script: Script,
}

impl RedisTube {
    /// Connects to `url` and binds to tube `name` in namespace `space`.
    ///
    /// Tasks not acked or buried within `ttr` of being taken are delivered
    /// again.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Connection` if the server cannot be reached.
    pub async fn connect(
        url: &str,
        space: u32,
        name: &str,
        ttr: Duration,
    ) -> Result<Self, QueueError> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            prefix: format!("q{}:{}", space, name),
            ttr,
            take_script: Script::new(TAKE_SCRIPT),
        })
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.prefix, suffix)
    }

    async fn claim(&self) -> Result<Option<String>, QueueError> {
        let mut conn = self.conn.clone();
        let now = now_millis();
        let id: Option<String> = self
            .take_script
            .key(self.key("ready"))
            .key(self.key("delayed"))
            .key(self.key("taken"))
            .arg(now)
            .arg(now.saturating_add(millis(self.ttr)))
            .invoke_async(&mut conn)
            .await?;
        Ok(id)
    }

    async fn remove_taken(&self, task_id: &str) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("ZREM")
            .arg(self.key("taken"))
            .arg(task_id)
            .query_async(&mut conn)
            .await?;
        if removed == 0 {
            return Err(QueueError::UnknownTask(task_id.to_string()));
        }
        Ok(())
    }

    async fn store(&self, data: &TaskData) -> Result<String, QueueError> {
        let mut conn = self.conn.clone();
        let id = uuid::Uuid::new_v4().to_string();
        let payload = serde_json::to_string(data)?;
        redis::cmd("HSET")
            .arg(self.key("data"))
            .arg(&id)
            .arg(payload)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(id)
    }
}

#[async_trait]
impl Tube for RedisTube {
    async fn take(&self, timeout: Duration) -> Result<Option<Task>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let id = loop {
            if let Some(id) = self.claim().await? {
                break id;
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            tokio::time::sleep(remaining.min(TAKE_POLL_INTERVAL)).await;
        };

        let mut conn = self.conn.clone();
        let payload: Option<String> = redis::cmd("HGET")
            .arg(self.key("data"))
            .arg(&id)
            .query_async(&mut conn)
            .await?;
        let Some(payload) = payload else {
            self.remove_taken(&id).await?;
            return Err(QueueError::UnknownTask(id));
        };

        let data: TaskData = serde_json::from_str(&payload)?;
        debug!("Took task {} from {}", id, self.prefix);
        Ok(Some(Task { task_id: id, data }))
    }

    async fn ack(&self, task: &Task) -> Result<(), QueueError> {
        self.remove_taken(&task.task_id).await?;
        let mut conn = self.conn.clone();
        redis::cmd("HDEL")
            .arg(self.key("data"))
            .arg(&task.task_id)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn bury(&self, task: &Task) -> Result<(), QueueError> {
        self.remove_taken(&task.task_id).await?;
        let mut conn = self.conn.clone();
        redis::cmd("LPUSH")
            .arg(self.key("buried"))
            .arg(&task.task_id)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn put(&self, data: TaskData) -> Result<(), QueueError> {
        let id = self.store(&data).await?;
        let mut conn = self.conn.clone();
        redis::cmd("LPUSH")
            .arg(self.key("ready"))
            .arg(&id)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn put_delayed(&self, data: TaskData, delay: Duration) -> Result<(), QueueError> {
        let id = self.store(&data).await?;
        let mut conn = self.conn.clone();
        let due = now_millis().saturating_add(millis(delay));
        redis::cmd("ZADD")
            .arg(self.key("delayed"))
            .arg(due)
            .arg(&id)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
