//! Concrete [`KeyValueMedium`](wallet_core::storage::KeyValueMedium) backends.

pub mod file;
pub mod memory;
pub mod unavailable;

pub use file::FileMedium;
pub use memory::MemoryMedium;
pub use unavailable::UnavailableMedium;
