//! Worker loop and process entry point.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::fetch::{HttpFetcher, ResolveHop, Resolver, WalkOptions};
use crate::initialization::{init_redirect_client, init_tube, init_url_patterns};
use crate::queue::Tube;
use crate::worker::liveness::{ParentLiveness, ProcessAnchor};
use crate::worker::task::{get_redirect_history_from_task, TaskOutcome};

/// Timing and walk parameters of one worker.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub walk: WalkOptions,
    /// Bounded wait for each take
    pub take_timeout: Duration,
    /// Delay before a requeued task is retried
    pub recheck_delay: Duration,
}

impl WorkerSettings {
    pub fn from_config(config: &Config, walk: WalkOptions) -> Self {
        Self {
            walk,
            take_timeout: config.queue_take_timeout,
            recheck_delay: config.recheck_delay,
        }
    }
}

/// Processes tasks from `input` while the parent process is alive.
///
/// Liveness is checked before every take, so a dead parent means no further
/// take. Queue errors are logged per task and never end the loop: a failed
/// take is retried after `take_timeout`, a failed write buries the task, and a
/// failed ack is left to the queue's redelivery.
pub async fn worker_loop(
    input: &dyn Tube,
    output: &dyn Tube,
    resolver: &dyn ResolveHop,
    liveness: &dyn ParentLiveness,
    settings: &WorkerSettings,
) {
    while liveness.is_alive() {
        let task = match input.take(settings.take_timeout).await {
            Ok(Some(task)) => task,
            Ok(None) => continue,
            Err(e) => {
                error!("Failed to take task: {}", e);
                tokio::time::sleep(settings.take_timeout).await;
                continue;
            }
        };

        info!(
            "Processing task {} (url: {})",
            task.task_id,
            task.get_str("url").unwrap_or("<missing>")
        );

        let Some(outcome) = get_redirect_history_from_task(&task, resolver, &settings.walk).await
        else {
            warn!("Task {} has no url or url_id, skipping", task.task_id);
            continue;
        };

        let written = match outcome {
            TaskOutcome::Recheck(data) => {
                debug!("Requeueing task {} for recheck", task.task_id);
                input.put_delayed(data, settings.recheck_delay).await
            }
            TaskOutcome::Report(data) => output.put(data).await,
        };
        if let Err(e) = written {
            error!("Failed to write result of task {}: {}", task.task_id, e);
            if let Err(e) = input.bury(&task).await {
                error!("Failed to bury task {}: {}", task.task_id, e);
            }
            continue;
        }

        if let Err(e) = input.ack(&task).await {
            error!("Failed to ack task {}: {}", task.task_id, e);
        }
    }
    info!("Parent process is gone, worker exiting");
}

/// Entry point of a worker process.
///
/// Connects its own client and tubes, then runs [`worker_loop`] anchored on
/// `parent_pid`.
///
/// # Errors
///
/// Returns an error if the HTTP client, the URL patterns or a tube cannot be
/// set up.
pub async fn run_worker(config: &Config, parent_pid: u32) -> Result<()> {
    let client = init_redirect_client(config).context("Failed to initialize HTTP client")?;
    let (skip, ignored) = init_url_patterns(config).context("Invalid URL patterns")?;
    let input = init_tube(config, &config.input_tube)
        .await
        .context("Failed to connect to input tube")?;
    let output = init_tube(config, &config.output_tube)
        .await
        .context("Failed to connect to output tube")?;

    let resolver = Resolver::new(HttpFetcher::new(client), ignored);
    let settings = WorkerSettings::from_config(config, WalkOptions::from_config(config, skip));
    let anchor = ProcessAnchor::new(parent_pid);

    info!(
        "Worker {} started (parent {})",
        std::process::id(),
        anchor.pid()
    );
    worker_loop(
        input.as_ref(),
        output.as_ref(),
        &resolver,
        &anchor,
        &settings,
    )
    .await;
    Ok(())
}
