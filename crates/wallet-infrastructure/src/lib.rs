pub mod keys;
pub mod medium;
pub mod paths;
pub mod repository;
pub mod scheduler;
pub mod store;

pub use crate::medium::{FileMedium, MemoryMedium, UnavailableMedium};
pub use crate::repository::DurableWalletRepository;
pub use crate::scheduler::{FiredTimer, TokioScheduler, VirtualScheduler};
pub use crate::store::{DurableStore, SessionStore};
