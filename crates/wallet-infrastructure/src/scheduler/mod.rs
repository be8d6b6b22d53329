//! [`Scheduler`](wallet_core::scheduler::Scheduler) implementations.

pub mod tokio_timer;
pub mod virtual_clock;

pub use tokio_timer::{FiredTimer, TokioScheduler};
pub use virtual_clock::VirtualScheduler;
