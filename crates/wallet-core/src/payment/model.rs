use crate::transaction::TransactionStatus;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An attached receipt file. Only its presence is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub file_name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPaymentRequest {
    pub amount_usd: f64,
    /// `None` means the card on file is used.
    pub card: Option<CardDetails>,
    pub otp: String,
    pub save_card: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransferRequest {
    pub amount_usd: f64,
    pub reference: String,
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobilePaymentRequest {
    pub amount_usd: f64,
    pub reference: String,
    pub concept: String,
    pub receipt: Option<Receipt>,
}

/// Back-office settlement decision for a pending transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    Approve,
    Reject { reason: String },
}

/// What a successful submission hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub transaction_id: String,
    pub status: TransactionStatus,
    /// Scripted delay until the next lifecycle step.
    pub next_step_in: Option<Duration>,
}
