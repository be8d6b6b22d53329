//! Events published by the engine for a presentation layer to render.

use crate::currency::Balance;
use crate::evolution::{DocumentStage, EvolutionStage, StageView};
use crate::verification::VerificationStatus;
use serde::Serialize;
use std::time::Duration;
use strum::Display;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEvent {
    BalanceChanged {
        balance: Balance,
    },
    LedgerChanged {
        transaction_id: Option<String>,
        pending: usize,
        total: usize,
    },
    VerificationChanged {
        status: VerificationStatus,
    },
    StageChanged {
        from: EvolutionStage,
        to: EvolutionStage,
    },
    /// Emitted on every recomputation, changed or not.
    StageRefreshed {
        view: StageView,
    },
    DocumentAnalysisProgress {
        stage: DocumentStage,
        progress_percent: u8,
    },
    Notification {
        notification: Notification,
    },
    InactivityWarning {
        logout_in: Duration,
    },
    SessionEnded {
        reason: SessionEndReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionEndReason {
    Logout,
    Inactivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// The one terminal outcome surfaced for a submission, or a lifecycle notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationAction {
    /// Resubmit using exactly this concept text.
    Resubmit { concept: String },
    ContactSupport { phone: String, message: String },
}
