use super::model::{EvolutionStage, ProcessingWindow};
use crate::transaction::{Ledger, PaymentMethod, TransactionKind, TransactionStatus};
use crate::user::{BankLinkData, UserProfile};
use crate::verification::{VerificationRecord, VerificationStatus};
use chrono::{DateTime, Utc};

/// Everything the stage derivation looks at.
#[derive(Debug, Clone, Copy)]
pub struct StageInputs<'a> {
    pub profile: &'a UserProfile,
    pub verification: &'a VerificationRecord,
    pub ledger: &'a Ledger,
    pub processing_window: Option<ProcessingWindow>,
    pub bank_link: Option<&'a BankLinkData>,
    pub now: DateTime<Utc>,
    pub mobile_onboarding_min_usd: f64,
}

/// Derives the onboarding stage. Rules are checked in priority order and the
/// first match wins; the function has no side effects.
pub fn derive_stage(inputs: &StageInputs<'_>) -> EvolutionStage {
    if !inputs.profile.has_made_first_recharge {
        return EvolutionStage::FirstRecharge;
    }

    if has_onboarding_mobile_payment(inputs.ledger, inputs.mobile_onboarding_min_usd) {
        return EvolutionStage::FirstMobilePayment;
    }

    let status = inputs.verification.status;
    if status == VerificationStatus::Unverified {
        return EvolutionStage::NeedsVerification;
    }

    if inputs
        .processing_window
        .is_some_and(|window| window.is_active(inputs.now))
    {
        return EvolutionStage::ProcessingDocs;
    }

    if status == VerificationStatus::Verified || inputs.bank_link.is_some() {
        return EvolutionStage::ReadyForBanking;
    }

    if status == VerificationStatus::BankValidated {
        return EvolutionStage::BankingValidated;
    }

    EvolutionStage::FirstRecharge
}

fn has_onboarding_mobile_payment(ledger: &Ledger, min_usd: f64) -> bool {
    ledger.transactions().iter().any(|tx| {
        tx.kind == TransactionKind::Deposit
            && tx.method == Some(PaymentMethod::MobilePayment)
            && tx.amount >= min_usd
            && matches!(
                tx.status,
                TransactionStatus::Processing | TransactionStatus::PendingReview
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use std::time::Duration;

    struct Fixture {
        profile: UserProfile,
        verification: VerificationRecord,
        ledger: Ledger,
        window: Option<ProcessingWindow>,
        bank: Option<BankLinkData>,
        now: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut profile = UserProfile::new("Ana Gil", "ana@example.com", "device_a");
            profile.has_made_first_recharge = true;
            Self {
                profile,
                verification: VerificationRecord::default(),
                ledger: Ledger::new(),
                window: None,
                bank: None,
                now: Utc::now(),
            }
        }

        fn stage(&self) -> EvolutionStage {
            derive_stage(&StageInputs {
                profile: &self.profile,
                verification: &self.verification,
                ledger: &self.ledger,
                processing_window: self.window,
                bank_link: self.bank.as_ref(),
                now: self.now,
                mobile_onboarding_min_usd: 25.0,
            })
        }
    }

    fn mobile(amount: f64, status: TransactionStatus) -> Transaction {
        Transaction {
            id: Transaction::generate_id("MP_", Utc::now()),
            kind: TransactionKind::Deposit,
            method: Some(PaymentMethod::MobilePayment),
            amount,
            amount_bs: amount * 138.24,
            amount_eur: amount * 0.94,
            reference: Some("REF".to_string()),
            concept: Some("4454651".to_string()),
            description: String::new(),
            destination: None,
            card_label: None,
            status,
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
            balance_snapshot: None,
        }
    }

    #[test]
    fn test_first_recharge_dominates_verified() {
        let mut f = Fixture::new();
        f.profile.has_made_first_recharge = false;
        f.verification.status = VerificationStatus::Verified;
        assert_eq!(f.stage(), EvolutionStage::FirstRecharge);
    }

    #[test]
    fn test_pending_mobile_payment_over_threshold() {
        let mut f = Fixture::new();
        f.ledger.prepend(mobile(25.0, TransactionStatus::PendingReview));
        assert_eq!(f.stage(), EvolutionStage::FirstMobilePayment);

        let mut f = Fixture::new();
        f.ledger.prepend(mobile(24.99, TransactionStatus::Processing));
        assert_eq!(f.stage(), EvolutionStage::NeedsVerification);

        let mut f = Fixture::new();
        f.ledger.prepend(mobile(30.0, TransactionStatus::Completed));
        assert_eq!(f.stage(), EvolutionStage::NeedsVerification);
    }

    #[test]
    fn test_processing_window() {
        let mut f = Fixture::new();
        f.verification.status = VerificationStatus::Processing;
        f.window = Some(ProcessingWindow::new(f.now, Duration::from_secs(600)));
        assert_eq!(f.stage(), EvolutionStage::ProcessingDocs);

        f.now += chrono::Duration::seconds(601);
        assert_eq!(f.stage(), EvolutionStage::FirstRecharge);
        f.verification.status = VerificationStatus::Verified;
        assert_eq!(f.stage(), EvolutionStage::ReadyForBanking);
    }

    #[test]
    fn test_bank_link_and_validated() {
        let mut f = Fixture::new();
        f.verification.status = VerificationStatus::BankValidation;
        f.bank = Some(BankLinkData {
            name: "Banesco".to_string(),
            account_number: None,
            logo: None,
        });
        assert_eq!(f.stage(), EvolutionStage::ReadyForBanking);

        f.bank = None;
        f.verification.status = VerificationStatus::BankValidated;
        assert_eq!(f.stage(), EvolutionStage::BankingValidated);
    }
}
