//! Worker pool and supervisor tick loop.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::app::Shutdown;
use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::supervisor::probe::{HttpProbe, NetworkProbe};
use crate::supervisor::spawn::{WorkerHandle, WorkerSpawner};

/// Fixed-size set of worker processes bound to one parent.
pub struct WorkerPool {
    spawner: Box<dyn WorkerSpawner>,
    workers: Vec<Box<dyn WorkerHandle>>,
    target: usize,
    parent_pid: u32,
}

impl WorkerPool {
    pub fn new(spawner: Box<dyn WorkerSpawner>, target: usize, parent_pid: u32) -> Self {
        Self {
            spawner,
            workers: Vec::with_capacity(target),
            target,
            parent_pid,
        }
    }

    /// Forgets exited workers and returns how many are still running.
    pub fn live_count(&mut self) -> usize {
        self.workers.retain_mut(|worker| worker.is_running());
        self.workers.len()
    }

    /// Spawns `target - live` workers and returns how many were started.
    ///
    /// # Errors
    ///
    /// Stops at the first spawn failure; workers started before it are kept.
    pub fn top_up(&mut self) -> Result<usize, InitializationError> {
        let missing = self.target.saturating_sub(self.live_count());
        for _ in 0..missing {
            let worker = self.spawner.spawn(self.parent_pid)?;
            self.workers.push(worker);
        }
        if missing > 0 {
            info!("Started {} worker(s), pool size {}", missing, self.target);
        }
        Ok(missing)
    }

    /// Sends every running worker a termination request.
    pub fn terminate_all(&mut self) {
        for worker in self.workers.iter_mut() {
            if worker.is_running() {
                worker.terminate();
            }
        }
    }
}

/// Runs supervisor ticks until `shutdown` is cancelled.
///
/// Each tick probes the network: when reachable the pool is topped up, when
/// not every worker is asked to terminate. The tick then sleeps for `sleep`.
///
/// # Errors
///
/// Returns the spawn error that interrupted a top-up.
pub async fn main_loop(
    pool: &mut WorkerPool,
    probe: &dyn NetworkProbe,
    sleep: Duration,
    shutdown: &CancellationToken,
) -> Result<(), InitializationError> {
    while !shutdown.is_cancelled() {
        if probe.is_reachable().await {
            let spawned = pool.top_up()?;
            debug!("Tick done, {} spawned", spawned);
        } else {
            error!("Network is down, stopping workers");
            pool.terminate_all();
        }

        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(sleep) => {}
        }
    }
    Ok(())
}

/// Entry point of the redirect-check supervisor.
///
/// Runs [`supervise`] with an HTTP reachability probe.
///
/// # Errors
///
/// Returns an error if the network probe cannot be set up.
pub async fn run_redirect_checker(
    config: &Config,
    spawner: Box<dyn WorkerSpawner>,
    shutdown: &Shutdown,
) -> Result<i32> {
    let probe = HttpProbe::from_config(config).context("Failed to initialize network probe")?;
    Ok(supervise(config, spawner, &probe, shutdown).await)
}

/// Runs [`main_loop`] with this process as the workers' parent, restarting it
/// after `sleep_on_fail` whenever it fails, until shutdown. Returns the exit
/// code recorded by the shutdown signal.
pub async fn supervise(
    config: &Config,
    spawner: Box<dyn WorkerSpawner>,
    probe: &dyn NetworkProbe,
    shutdown: &Shutdown,
) -> i32 {
    let parent_pid = std::process::id();
    let mut pool = WorkerPool::new(spawner, config.worker_pool_size, parent_pid);

    info!(
        "Supervisor {} started, pool size {}",
        parent_pid, config.worker_pool_size
    );
    while !shutdown.is_requested() {
        match main_loop(&mut pool, probe, config.sleep, shutdown.token()).await {
            Ok(()) => break,
            Err(e) => {
                error!("Supervisor loop failed: {}", e);
                tokio::select! {
                    _ = shutdown.token().cancelled() => {}
                    _ = tokio::time::sleep(config.sleep_on_fail) => {}
                }
            }
        }
    }

    info!("Supervisor stopped");
    shutdown.exit_code()
}
