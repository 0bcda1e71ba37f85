//! Turning a redirect-check task into what the worker writes back.

use serde_json::Value;

use crate::fetch::{get_redirect_history, ResolveHop, WalkOptions};
use crate::queue::{Task, TaskData};

/// Where the worker sends the data built for a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Requeue on the input tube for a delayed second attempt
    Recheck(TaskData),
    /// Result record for the output tube
    Report(TaskData),
}

/// Walks the task's URL and builds the outcome.
///
/// A history with an ERROR hop on a first attempt yields
/// [`TaskOutcome::Recheck`] with a copy of the task data flagged `recheck`.
/// Anything else yields the result record: `url_id`, `result` as
/// `[types, urls, counters]`, `check_type` and the task's `suspicious` value,
/// copied as is whenever it is present and not null.
///
/// Returns `None` when the task has no `url` or `url_id`.
pub async fn get_redirect_history_from_task<R>(
    task: &Task,
    resolver: &R,
    options: &WalkOptions,
) -> Option<TaskOutcome>
where
    R: ResolveHop + ?Sized,
{
    let url = task.get_str("url")?;
    let url_id = task.data.get("url_id")?.clone();

    let history = get_redirect_history(resolver, url, options).await;

    if history.has_error() && !task.flag("recheck") {
        let mut data = task.data.clone();
        data.insert("recheck".to_string(), Value::Bool(true));
        return Some(TaskOutcome::Recheck(data));
    }

    let mut data = TaskData::new();
    data.insert("url_id".to_string(), url_id);
    data.insert("result".to_string(), history.to_result());
    data.insert("check_type".to_string(), Value::from("normal"));
    if let Some(suspicious) = task.data.get("suspicious").filter(|v| !v.is_null()) {
        data.insert("suspicious".to_string(), suspicious.clone());
    }
    Some(TaskOutcome::Report(data))
}
