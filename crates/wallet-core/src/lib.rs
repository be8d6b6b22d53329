pub mod config;
pub mod currency;
pub mod error;
pub mod event;
pub mod evolution;
pub mod payment;
pub mod repository;
pub mod scheduler;
pub mod storage;
pub mod transaction;
pub mod user;
pub mod verification;

// Re-export common error type
pub use error::{Result, WalletError};
