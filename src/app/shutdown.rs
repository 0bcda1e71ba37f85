//! Signal-driven shutdown.
//!
//! One [`Shutdown`] is shared by a process's loops. Signal handlers cancel it
//! and record `128 + signum` as the exit code; loops read it once per
//! iteration.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::config::SIGNAL_EXIT_CODE_OFFSET;

/// Signals that request a shutdown, with their POSIX numbers.
pub const SHUTDOWN_SIGNALS: [(i32, &str); 4] = [
    (15, "SIGTERM"),
    (2, "SIGINT"),
    (1, "SIGHUP"),
    (3, "SIGQUIT"),
];

/// Shared shutdown flag plus the exit code to report.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    exit_code: Arc<AtomicI32>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Requests shutdown on behalf of signal `signum`.
    pub fn stop(&self, signum: i32) {
        self.exit_code
            .store(SIGNAL_EXIT_CODE_OFFSET + signum, Ordering::SeqCst);
        self.token.cancel();
    }

    /// Exit code for the process: 0 unless a signal stopped it.
    pub fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }
}

/// Routes [`SHUTDOWN_SIGNALS`] to `shutdown`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be registered.
#[cfg(unix)]
pub fn install_signal_handlers(shutdown: &Shutdown) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    for (signum, name) in SHUTDOWN_SIGNALS {
        let mut stream = signal(SignalKind::from_raw(signum))?;
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                info!("Received {}, shutting down", name);
                shutdown.stop(signum);
            }
        });
    }
    Ok(())
}

/// Routes Ctrl-C to `shutdown`.
///
/// # Errors
///
/// Never fails on this platform.
#[cfg(not(unix))]
pub fn install_signal_handlers(shutdown: &Shutdown) -> std::io::Result<()> {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            shutdown.stop(2);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_shutdown_is_not_requested() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_requested());
        assert_eq!(shutdown.exit_code(), 0);
    }

    #[test]
    fn test_stop_sets_exit_code_and_cancels_clones() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        shutdown.stop(15);
        assert!(observer.is_requested());
        assert!(observer.token().is_cancelled());
        assert_eq!(observer.exit_code(), 143);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_installs_handlers() {
        let shutdown = Shutdown::new();
        install_signal_handlers(&shutdown).unwrap();
        assert!(!shutdown.is_requested());
    }
}
