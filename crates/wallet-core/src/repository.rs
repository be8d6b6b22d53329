//! Persistence boundary for wallet state.
//!
//! Implementations swallow store failures: loads answer `None`/empty for
//! absent, corrupt or foreign-device records, and saves report `false`.

use crate::currency::Balance;
use crate::evolution::EvolutionStage;
use crate::transaction::{Ledger, Transaction};
use crate::user::{BankLinkData, CardData, RegistrationRecord, UserProfile};
use crate::verification::VerificationRecord;
use chrono::{DateTime, Utc};

/// Timestamps persisted for motivational copy and the external poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Milestone {
    LastInteraction,
    LastRecharge,
    LastVerification,
    LastExternalVerificationCheck,
}

/// A submission written by the external identity-verification flow.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalVerification {
    pub submitted_at: DateTime<Utc>,
    pub bank_link: Option<BankLinkData>,
}

pub trait WalletRepository: Send + Sync {
    /// `false` once the underlying medium failed its availability probe.
    fn is_available(&self) -> bool;

    /// Format version stamped into stored records.
    fn storage_version(&self) -> String;

    /// Drops undecodable or checksum-failing records. Returns how many.
    fn purge_corrupted(&self) -> usize;

    /// Stable per-install identifier, created on first use.
    fn device_id(&self) -> String;

    fn load_profile(&self) -> Option<UserProfile>;
    fn save_profile(&self, profile: &UserProfile) -> bool;

    fn load_balance(&self) -> Option<Balance>;
    fn save_balance(&self, balance: &Balance) -> bool;

    fn load_ledger(&self) -> Ledger;
    fn save_ledger(&self, ledger: &Ledger) -> bool;

    fn load_pending_bank_transfers(&self) -> Vec<Transaction>;
    fn save_pending_bank_transfers(&self, transfers: &[Transaction]) -> bool;

    fn load_card_data(&self) -> Option<CardData>;
    fn save_card_data(&self, card: &CardData) -> bool;

    fn load_first_recharge(&self) -> bool;
    fn save_first_recharge(&self, done: bool) -> bool;

    fn load_verification(&self) -> Option<VerificationRecord>;
    fn save_verification(&self, record: &VerificationRecord) -> bool;

    fn load_registration(&self) -> Option<RegistrationRecord>;
    fn save_registration(&self, record: &RegistrationRecord) -> bool;
    fn is_registered(&self) -> bool;

    /// Last computed stage. A hint only, never trusted over a recomputation.
    fn load_stage(&self) -> Option<EvolutionStage>;
    fn save_stage(&self, stage: EvolutionStage) -> bool;

    fn load_processing_start(&self) -> Option<DateTime<Utc>>;
    fn save_processing_start(&self, started_at: DateTime<Utc>) -> bool;
    fn clear_processing_start(&self) -> bool;

    fn load_milestone(&self, milestone: Milestone) -> Option<DateTime<Utc>>;
    fn save_milestone(&self, milestone: Milestone, at: DateTime<Utc>) -> bool;

    /// The saved bank-link snapshot, else whatever the external
    /// bank-validation flow wrote.
    fn load_bank_link(&self) -> Option<BankLinkData>;
    fn save_bank_link(&self, data: &BankLinkData) -> bool;
    /// Only the keys written by the external flow, ignoring the snapshot.
    fn load_external_bank_link(&self) -> Option<BankLinkData>;
    fn load_external_verification(&self) -> Option<ExternalVerification>;
}
