//! Record stores layered over a [`KeyValueMedium`](wallet_core::storage::KeyValueMedium).

pub mod checksum;
pub mod codec;
pub mod durable;
pub mod session;

pub use durable::{DurableStore, LoadedRecord, RecordMetadata};
pub use session::SessionStore;
