//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `redirect_checker` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger and signal handler setup
//! - Dispatch to the supervisor, a worker or the notification pusher
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::process;

use redirect_checker::app::install_signal_handlers;
use redirect_checker::config::WORKER_CONFIG_ENV;
use redirect_checker::initialization::init_logger_with;
use redirect_checker::supervisor::ProcessSpawner;
use redirect_checker::{
    run_notification_pusher, run_redirect_checker, run_worker, Command, Config, Opt, Shutdown,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    match run(&opt).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("redirect_checker error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(opt: &Opt) -> Result<i32> {
    match &opt.command {
        Command::Worker { parent_pid } => {
            let config = worker_config(opt)?;
            run_worker(&config, *parent_pid).await?;
            Ok(0)
        }
        Command::RedirectChecker => {
            let config = opt.to_config();
            let shutdown = Shutdown::new();
            install_signal_handlers(&shutdown).context("Failed to install signal handlers")?;
            let spawner = ProcessSpawner::current_exe(logging_args(opt), &config)
                .context("Failed to prepare worker spawner")?;
            run_redirect_checker(&config, Box::new(spawner), &shutdown).await
        }
        Command::NotificationPusher => {
            let config = opt.to_config();
            let shutdown = Shutdown::new();
            install_signal_handlers(&shutdown).context("Failed to install signal handlers")?;
            run_notification_pusher(&config, &shutdown).await
        }
    }
}

/// Workers take the supervisor's configuration when it was handed down.
fn worker_config(opt: &Opt) -> Result<Config> {
    match std::env::var(WORKER_CONFIG_ENV) {
        Ok(json) => serde_json::from_str(&json)
            .with_context(|| format!("Invalid configuration in {}", WORKER_CONFIG_ENV)),
        Err(_) => Ok(opt.to_config()),
    }
}

/// Logging flags repeated on every worker command line.
fn logging_args(opt: &Opt) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(level) = opt.log_level.to_possible_value() {
        args.push("--log-level".to_string());
        args.push(level.get_name().to_string());
    }
    if let Some(format) = opt.log_format.to_possible_value() {
        args.push("--log-format".to_string());
        args.push(format.get_name().to_string());
    }
    args
}
