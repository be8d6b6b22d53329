//! Onboarding progression: a single derived stage plus the timing helpers
//! the widget needs around it.

pub mod copy;
pub mod derive;
pub mod model;
pub mod reminder;

pub use derive::{StageInputs, derive_stage};
pub use model::{DocumentStage, EvolutionStage, ProcessingWindow, StageView};
pub use reminder::time_bucket;
