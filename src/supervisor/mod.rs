//! Redirect-check supervisor.
//!
//! Keeps a pool of worker processes at its target size while the network is
//! reachable and asks them all to stop while it is not.

mod pool;
mod probe;
mod spawn;

pub use pool::{main_loop, run_redirect_checker, supervise, WorkerPool};
pub use probe::{HttpProbe, NetworkProbe};
pub use spawn::{ProcessHandle, ProcessSpawner, WorkerHandle, WorkerSpawner};
