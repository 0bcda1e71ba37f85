//! Notification pusher.
//!
//! Drains the notification tube and posts each task to its callback URL from
//! a bounded pool of concurrent dispatches.

mod dispatch;
mod pusher;

pub use dispatch::{callback_payload, notification_worker, OutcomeAction, PendingOutcome};
pub use pusher::{
    done_with_processed_tasks, main_loop, restart_loop, run_notification_pusher, PusherSettings,
};
