//! Time and deferred work.
//!
//! Every multi-step flow is a chain of [`ScheduledTask`]s. A scheduler only
//! stores and fires them; the engine decides what each one means, so a
//! virtual clock can replay the same chain deterministically in tests.

use crate::evolution::DocumentStage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum ScheduledTask {
    /// Approve a card deposit after its progress delay.
    CardPaymentResolve {
        transaction_id: String,
        save_card: bool,
    },
    /// Move a bank transfer from processing to pending.
    BankTransferRegister { transaction_id: String },
    /// Run concept matching on a mobile payment.
    MobilePaymentValidate { transaction_id: String },
    /// Final rejection of a mobile payment under review.
    MobilePaymentReject { transaction_id: String },
    ProcessingWindowExpired,
    DocumentStage { stage: DocumentStage },
    /// Redraw-only refresh of motivational copy.
    Reminder { hours: u32 },
    InactivityWarning,
    InactivityLogout,
    VerificationPoll,
}

impl ScheduledTask {
    pub fn is_reminder(&self) -> bool {
        matches!(self, Self::Reminder { .. })
    }

    pub fn is_inactivity(&self) -> bool {
        matches!(self, Self::InactivityWarning | Self::InactivityLogout)
    }

    pub fn is_document_analysis(&self) -> bool {
        matches!(self, Self::ProcessingWindowExpired | Self::DocumentStage { .. })
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Injected into every component that waits.
pub trait Scheduler: Clock {
    /// Registers `task` to fire once after `delay`.
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) -> TimerId;

    /// Cancels a timer. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
