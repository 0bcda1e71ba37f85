//! Parent-process liveness.

use std::path::PathBuf;

/// Tells a worker whether the process that spawned it is still around.
///
/// Polled before every take; a worker whose parent is gone stops taking work.
pub trait ParentLiveness: Send + Sync {
    fn is_alive(&self) -> bool;
}

impl<F> ParentLiveness for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_alive(&self) -> bool {
        self()
    }
}

/// Liveness anchored on a process id, checked through `/proc`.
#[derive(Debug, Clone)]
pub struct ProcessAnchor {
    pid: u32,
    proc_root: PathBuf,
}

impl ProcessAnchor {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            proc_root: PathBuf::from("/proc"),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl ParentLiveness for ProcessAnchor {
    fn is_alive(&self) -> bool {
        self.proc_root.join(self.pid.to_string()).exists()
    }
}
