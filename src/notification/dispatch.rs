//! Single notification dispatch.

use log::{error, info, warn};
use serde_json::Value;
use strum_macros::Display;
use tokio::sync::mpsc::UnboundedSender;

use crate::queue::{Task, TaskData};

/// What the drain step does with a dispatched task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutcomeAction {
    Ack,
    Bury,
}

/// A finished dispatch waiting to be applied to the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOutcome {
    pub task: Task,
    pub action: OutcomeAction,
}

/// Body posted to the callback: the task data without `callback_url`, with
/// `id` set to the task id.
pub fn callback_payload(task: &Task) -> TaskData {
    let mut payload = task.data.clone();
    payload.remove("callback_url");
    payload.insert("id".to_string(), Value::from(task.task_id.clone()));
    payload
}

/// Posts `task` to its `callback_url` and reports exactly one outcome.
///
/// Any response, whatever its status, acks the task. A transport failure or a
/// missing callback URL buries it. Nothing escapes this function; the outcome
/// is lost only if the drain side is gone.
pub async fn notification_worker(
    client: &reqwest::Client,
    task: Task,
    outcomes: &UnboundedSender<PendingOutcome>,
) {
    let action = match task.get_str("callback_url") {
        Some(callback_url) => {
            info!("Posting notification {} to {}", task.task_id, callback_url);
            match client
                .post(callback_url)
                .json(&callback_payload(&task))
                .send()
                .await
            {
                Ok(response) => {
                    info!(
                        "Callback for task {} answered {}",
                        task.task_id,
                        response.status()
                    );
                    OutcomeAction::Ack
                }
                Err(e) => {
                    error!("Callback for task {} failed: {}", task.task_id, e);
                    OutcomeAction::Bury
                }
            }
        }
        None => {
            error!("Task {} has no callback_url", task.task_id);
            OutcomeAction::Bury
        }
    };

    if let Err(e) = outcomes.send(PendingOutcome { task, action }) {
        warn!(
            "Outcome channel closed, task {} left unresolved",
            e.0.task.task_id
        );
    }
}
