//! Worker process spawning.

use std::path::PathBuf;
use std::process::Stdio;

use log::{info, warn};
use tokio::process::{Child, Command};

use crate::config::{Config, WORKER_CONFIG_ENV};
use crate::error_handling::InitializationError;

/// A spawned worker as seen by the supervisor.
pub trait WorkerHandle: Send {
    /// OS process id, when known.
    fn id(&self) -> Option<u32>;

    /// True until the worker has exited.
    fn is_running(&mut self) -> bool;

    /// Requests termination without waiting for it.
    fn terminate(&mut self);
}

/// Starts workers bound to a parent process.
pub trait WorkerSpawner: Send + Sync {
    /// Starts one worker that runs while `parent_pid` is alive.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::SpawnError` if the worker cannot start.
    fn spawn(&self, parent_pid: u32) -> Result<Box<dyn WorkerHandle>, InitializationError>;
}

/// Spawns workers as child processes of a binary's `worker` subcommand.
///
/// The configuration travels as JSON in [`WORKER_CONFIG_ENV`].
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
    args: Vec<String>,
    config_json: String,
}

impl ProcessSpawner {
    /// Spawner for `program`, passing `args` before the subcommand.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ConfigError` if `config` cannot be serialized.
    pub fn new(
        program: impl Into<PathBuf>,
        args: Vec<String>,
        config: &Config,
    ) -> Result<Self, InitializationError> {
        Ok(Self {
            program: program.into(),
            args,
            config_json: serde_json::to_string(config)?,
        })
    }

    /// Spawner re-running the current executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable path is unknown or `config` cannot
    /// be serialized.
    pub fn current_exe(args: Vec<String>, config: &Config) -> Result<Self, InitializationError> {
        Self::new(std::env::current_exe()?, args, config)
    }

    fn command(&self, parent_pid: u32) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("worker")
            .arg("--parent-pid")
            .arg(parent_pid.to_string())
            .env(WORKER_CONFIG_ENV, &self.config_json)
            .stdin(Stdio::null());
        cmd
    }
}

impl WorkerSpawner for ProcessSpawner {
    fn spawn(&self, parent_pid: u32) -> Result<Box<dyn WorkerHandle>, InitializationError> {
        let child = self.command(parent_pid).spawn()?;
        info!(
            "Spawned worker {} for parent {}",
            child.id().unwrap_or_default(),
            parent_pid
        );
        Ok(Box::new(ProcessHandle { child }))
    }
}

/// Child-process worker handle.
pub struct ProcessHandle {
    child: Child,
}

impl WorkerHandle for ProcessHandle {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                info!("Worker exited with {}", status);
                false
            }
            Err(e) => {
                warn!("Failed to poll worker status: {}", e);
                false
            }
        }
    }

    fn terminate(&mut self) {
        info!("Terminating worker {}", self.id().unwrap_or_default());
        if let Err(e) = self.child.start_kill() {
            warn!("Failed to terminate worker: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_carries_pid_and_config() {
        let config = Config {
            worker_pool_size: 3,
            ..Default::default()
        };
        let spawner = ProcessSpawner::new(
            "/usr/bin/redirect_checker",
            vec!["--log-level".to_string(), "debug".to_string()],
            &config,
        )
        .unwrap();
        let cmd = spawner.command(33);
        let std_cmd = cmd.as_std();

        assert_eq!(std_cmd.get_program(), "/usr/bin/redirect_checker");
        let args: Vec<_> = std_cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["--log-level", "debug", "worker", "--parent-pid", "33"]);

        let env = std_cmd
            .get_envs()
            .find(|(key, _)| *key == WORKER_CONFIG_ENV)
            .and_then(|(_, value)| value)
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap();
        let passed: Config = serde_json::from_str(&env).unwrap();
        assert_eq!(passed.worker_pool_size, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_handle_terminates_child() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let mut handle = ProcessHandle { child };
        assert!(handle.is_running());
        handle.terminate();
        handle.child.wait().await.unwrap();
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let spawner =
            ProcessSpawner::new("/nonexistent/redirect_checker", Vec::new(), &Config::default())
                .unwrap();
        assert!(matches!(
            spawner.spawn(1),
            Err(InitializationError::SpawnError(_))
        ));
    }
}
