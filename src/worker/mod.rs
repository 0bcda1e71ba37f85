//! Redirect-check worker.
//!
//! Each worker runs in its own process, spawned by the supervisor, and loops
//! take → walk → put → ack until its parent process disappears.

mod liveness;
mod process;
mod task;

pub use liveness::{ParentLiveness, ProcessAnchor};
pub use process::{run_worker, worker_loop, WorkerSettings};
pub use task::{get_redirect_history_from_task, TaskOutcome};
