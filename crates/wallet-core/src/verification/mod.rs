pub mod model;

pub use model::{VerificationRecord, VerificationStatus};
