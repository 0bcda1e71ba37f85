//! Notification dispatch pool.
//!
//! A semaphore bounds in-flight dispatches; each finished dispatch sends its
//! [`PendingOutcome`] down a channel that only the main loop drains, so ack
//! and bury calls never run concurrently.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app::Shutdown;
use crate::config::Config;
use crate::error_handling::{InitializationError, QueueError};
use crate::initialization::{init_callback_client, init_tube};
use crate::notification::dispatch::{notification_worker, OutcomeAction, PendingOutcome};
use crate::queue::Tube;

/// Takes never block the dispatch loop.
const NOTIFICATION_TAKE_TIMEOUT: Duration = Duration::ZERO;

/// Pool size and loop pacing.
#[derive(Debug, Clone)]
pub struct PusherSettings {
    /// Maximum dispatches in flight
    pub pool_size: usize,
    /// Pause between loop iterations
    pub sleep: Duration,
}

impl PusherSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pool_size: config.worker_pool_size,
            sleep: config.sleep,
        }
    }
}

/// Applies every outcome already queued, without waiting for more.
///
/// A queue error on one item is logged and the rest are still applied.
/// Returns how many outcomes were applied successfully.
pub async fn done_with_processed_tasks(
    outcomes: &mut UnboundedReceiver<PendingOutcome>,
    tube: &dyn Tube,
) -> usize {
    let mut applied = 0;
    while let Ok(PendingOutcome { task, action }) = outcomes.try_recv() {
        let result = match action {
            OutcomeAction::Ack => tube.ack(&task).await,
            OutcomeAction::Bury => tube.bury(&task).await,
        };
        match result {
            Ok(()) => {
                debug!("Task {} {}", task.task_id, action);
                applied += 1;
            }
            Err(e) => error!("Failed to {} task {}: {}", action, task.task_id, e),
        }
    }
    applied
}

/// Dispatches notifications from `tube` until `shutdown` is cancelled.
///
/// Every iteration takes one task per free slot and launches a dispatch for
/// it, drains finished outcomes, then sleeps. On the way out the pool waits
/// for dispatches still in flight and drains once more, also when a take
/// failed.
///
/// # Errors
///
/// Returns the queue error of a failed take.
pub async fn main_loop(
    tube: &dyn Tube,
    client: Arc<reqwest::Client>,
    settings: &PusherSettings,
    shutdown: &CancellationToken,
) -> Result<(), QueueError> {
    let slots = Arc::new(Semaphore::new(settings.pool_size));
    let (outcomes_tx, mut outcomes) = mpsc::unbounded_channel();

    let result = async {
        while !shutdown.is_cancelled() {
            debug!("{} free dispatch slot(s)", slots.available_permits());
            while let Ok(permit) = Arc::clone(&slots).try_acquire_owned() {
                let Some(task) = tube.take(NOTIFICATION_TAKE_TIMEOUT).await? else {
                    break;
                };
                debug!("Dispatching task {}", task.task_id);
                let client = Arc::clone(&client);
                let outcomes_tx = outcomes_tx.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    notification_worker(&client, task, &outcomes_tx).await;
                });
            }

            done_with_processed_tasks(&mut outcomes, tube).await;

            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(settings.sleep) => {}
            }
        }
        Ok::<(), QueueError>(())
    }
    .await;

    let in_flight = settings.pool_size - slots.available_permits();
    if in_flight > 0 {
        info!("Waiting for {} notification(s) in flight", in_flight);
    }
    let all_slots = u32::try_from(settings.pool_size).unwrap_or(u32::MAX);
    let _join = slots.acquire_many(all_slots).await;
    done_with_processed_tasks(&mut outcomes, tube).await;

    result
}

/// Entry point of the notification pusher.
///
/// Runs [`restart_loop`] against the configured notification tube.
///
/// # Errors
///
/// Returns an error if the callback client cannot be built.
pub async fn run_notification_pusher(config: &Config, shutdown: &Shutdown) -> Result<i32> {
    let client = init_callback_client(config).context("Failed to initialize callback client")?;
    let connect = move || async move {
        init_tube(config, &config.notification_tube)
            .await
            .map(|tube| tube as Arc<dyn Tube>)
    };
    Ok(restart_loop(config, client, connect, shutdown).await)
}

/// Runs [`main_loop`] on a tube from `connect`, reconnecting and restarting
/// after `sleep_on_fail` whenever the connection or the loop fails, until
/// shutdown. Returns the exit code recorded by the shutdown signal.
pub async fn restart_loop<C, Fut>(
    config: &Config,
    client: Arc<reqwest::Client>,
    connect: C,
    shutdown: &Shutdown,
) -> i32
where
    C: Fn() -> Fut,
    Fut: Future<Output = Result<Arc<dyn Tube>, InitializationError>>,
{
    let settings = PusherSettings::from_config(config);

    info!(
        "Notification pusher {} started, pool size {}",
        std::process::id(),
        settings.pool_size
    );
    while !shutdown.is_requested() {
        let run = async {
            let tube = connect().await?;
            main_loop(tube.as_ref(), Arc::clone(&client), &settings, shutdown.token()).await?;
            anyhow::Ok(())
        };
        match run.await {
            Ok(()) => break,
            Err(e) => {
                error!("Notification pusher loop failed: {:#}", e);
                tokio::select! {
                    _ = shutdown.token().cancelled() => {}
                    _ = tokio::time::sleep(config.sleep_on_fail) => {}
                }
            }
        }
    }

    info!("Notification pusher stopped");
    shutdown.exit_code()
}
