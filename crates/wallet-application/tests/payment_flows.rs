mod common;

use common::*;
use wallet_core::error::WalletError;
use wallet_core::event::{NotificationAction, NotificationLevel};
use wallet_core::evolution::EvolutionStage;
use wallet_core::payment::ReconcileOutcome;
use wallet_core::transaction::{PaymentMethod, TransactionStatus};

const RATE: f64 = 138.24;

fn assert_bs(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {} Bs, got {}",
        expected,
        actual
    );
}

// ============================================================================
// Mobile payments
// ============================================================================

#[test]
fn test_mobile_payment_with_accepted_concept_is_approved() {
    let mut h = Harness::logged_in();

    let submission = h
        .engine
        .submit_mobile_payment(&mobile(30.0, "REF1", "4454651"))
        .unwrap();
    assert_eq!(submission.status, TransactionStatus::Processing);
    assert!(submission.transaction_id.starts_with("MP_"));
    let tx = h.engine.transaction(&submission.transaction_id).unwrap();
    assert_eq!(tx.status, TransactionStatus::Processing);
    assert_eq!(tx.method, Some(PaymentMethod::MobilePayment));
    assert_eq!(h.engine.stage(), EvolutionStage::FirstMobilePayment);

    h.advance(secs(15));

    let tx = h.engine.transaction(&submission.transaction_id).unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert!(tx.approved_at.is_some());
    assert_bs(h.engine.balance().bs(), 30.0 * RATE);
    assert!(h.engine.user().unwrap().has_made_first_recharge);
    assert_eq!(h.engine.stage(), EvolutionStage::NeedsVerification);
}

#[test]
fn test_mobile_payment_concept_is_normalized() {
    let mut h = Harness::logged_in();
    let id = h
        .engine
        .submit_mobile_payment(&mobile(10.0, "REF1", " remeex 4454651 "))
        .unwrap()
        .transaction_id;

    h.advance(secs(15));

    assert_eq!(
        h.engine.transaction(&id).unwrap().status,
        TransactionStatus::Completed
    );
}

#[test]
fn test_mobile_payment_with_wrong_concept_is_reviewed_then_rejected() {
    let mut h = Harness::logged_in();
    let id = h
        .engine
        .submit_mobile_payment(&mobile(30.0, "REF2", "WRONG"))
        .unwrap()
        .transaction_id;

    h.advance(secs(15));
    assert_eq!(
        h.engine.transaction(&id).unwrap().status,
        TransactionStatus::PendingReview
    );
    assert_eq!(h.engine.stage(), EvolutionStage::FirstMobilePayment);

    let mut rx = h.engine.subscribe();
    h.advance(secs(30));

    let tx = h.engine.transaction(&id).unwrap();
    assert_eq!(tx.status, TransactionStatus::Rejected);
    assert_eq!(
        tx.rejection_reason.as_deref(),
        Some(h.engine.config().mobile_payment.rejection_reason.as_str())
    );
    assert!(tx.rejected_at.is_some());
    assert_eq!(
        tx.rejection_error(),
        Some(WalletError::SimulatedRejection {
            reason: h.engine.config().mobile_payment.rejection_reason.clone()
        })
    );
    assert_eq!(h.engine.balance().bs(), 0.0);

    let rejection = notifications(&drain(&mut rx))
        .into_iter()
        .find(|n| n.level == NotificationLevel::Error)
        .expect("rejection notification");
    assert!(rejection.actions.contains(&NotificationAction::Resubmit {
        concept: "4454651".to_string()
    }));
    assert!(rejection.actions.iter().any(|a| matches!(
        a,
        NotificationAction::ContactSupport { phone, message }
            if phone == "+17373018059" && message.contains("REF2")
    )));
}

#[test]
fn test_rejected_payment_never_changes_again() {
    let mut h = Harness::logged_in();
    let id = h
        .engine
        .submit_mobile_payment(&mobile(30.0, "REF2", "WRONG"))
        .unwrap()
        .transaction_id;
    h.advance(secs(45));
    let rejected = h.engine.transaction(&id).unwrap();

    h.advance_active(mins(3));

    assert_eq!(h.engine.transaction(&id).unwrap(), rejected);
}

#[test]
fn test_mobile_payment_requires_every_field() {
    let mut h = Harness::logged_in();

    let mut request = mobile(30.0, "REF", "");
    let err = h.engine.submit_mobile_payment(&request).unwrap_err();
    assert_eq!(err.field(), Some("concept"));

    request = mobile(30.0, "   ", "4454651");
    let err = h.engine.submit_mobile_payment(&request).unwrap_err();
    assert_eq!(err.field(), Some("reference"));

    request = mobile(30.0, "REF", "4454651");
    request.receipt = None;
    let err = h.engine.submit_mobile_payment(&request).unwrap_err();
    assert_eq!(err.field(), Some("receipt"));

    assert!(h.engine.transactions().is_empty());
}

// ============================================================================
// Bank transfers
// ============================================================================

#[test]
fn test_bank_transfer_never_credits_on_its_own() {
    let mut h = Harness::logged_in();
    let id = h
        .engine
        .submit_bank_transfer(&bank_transfer(50.0, "BT-0001"))
        .unwrap()
        .transaction_id;
    assert!(id.starts_with("BT_"));

    h.advance(secs(3));
    assert_eq!(
        h.engine.transaction(&id).unwrap().status,
        TransactionStatus::Pending
    );
    assert_eq!(h.engine.pending_bank_transfers().len(), 1);

    h.advance_active(mins(30));

    assert_eq!(
        h.engine.transaction(&id).unwrap().status,
        TransactionStatus::Pending
    );
    assert_eq!(h.engine.balance().bs(), 0.0);
}

#[test]
fn test_reconcile_settles_a_pending_transfer_once() {
    let mut h = Harness::logged_in();
    let id = h
        .engine
        .submit_bank_transfer(&bank_transfer(50.0, "BT-0001"))
        .unwrap()
        .transaction_id;
    h.advance(secs(3));

    let settled = h.engine.reconcile(&id, ReconcileOutcome::Approve).unwrap();
    assert_eq!(settled.status, TransactionStatus::Completed);
    assert_bs(h.engine.balance().bs(), 50.0 * RATE);
    assert!(h.engine.pending_bank_transfers().is_empty());

    let err = h
        .engine
        .reconcile(&id, ReconcileOutcome::Approve)
        .unwrap_err();
    assert!(err.is_validation());
    assert_bs(h.engine.balance().bs(), 50.0 * RATE);
}

#[test]
fn test_reconcile_rejection_keeps_balance() {
    let mut h = Harness::logged_in();
    let id = h
        .engine
        .submit_bank_transfer(&bank_transfer(50.0, "BT-0002"))
        .unwrap()
        .transaction_id;
    h.advance(secs(3));

    let settled = h
        .engine
        .reconcile(
            &id,
            ReconcileOutcome::Reject {
                reason: "Referencia no encontrada".to_string(),
            },
        )
        .unwrap();

    assert_eq!(settled.status, TransactionStatus::Rejected);
    assert_eq!(settled.rejection_reason.as_deref(), Some("Referencia no encontrada"));
    assert_eq!(h.engine.balance().bs(), 0.0);
}

#[test]
fn test_reconcile_unknown_transaction() {
    let mut h = Harness::logged_in();
    let err = h
        .engine
        .reconcile("BT_0_missing", ReconcileOutcome::Approve)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_bank_transfer_requires_receipt_and_reference() {
    let mut h = Harness::logged_in();

    let mut request = bank_transfer(50.0, "BT-0001");
    request.receipt = None;
    assert_eq!(
        h.engine.submit_bank_transfer(&request).unwrap_err().field(),
        Some("receipt")
    );

    let request = bank_transfer(50.0, "");
    assert_eq!(
        h.engine.submit_bank_transfer(&request).unwrap_err().field(),
        Some("reference")
    );
    assert!(h.engine.transactions().is_empty());
}

// ============================================================================
// Card payments
// ============================================================================

#[test]
fn test_card_payment_credits_and_counts() {
    let mut h = Harness::logged_in();
    let submission = h.engine.submit_card_payment(&card(20.0)).unwrap();
    assert!(submission.transaction_id.starts_with("CARD_"));
    assert_eq!(submission.next_step_in, Some(secs(4)));

    h.advance(secs(4));

    let tx = h.engine.transaction(&submission.transaction_id).unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.card_label.as_deref(), Some("****3009"));
    let snapshot = tx.balance_snapshot.unwrap();
    assert_eq!(snapshot.balance_before, 0.0);
    assert_bs(snapshot.balance_after, 20.0 * RATE);
    assert_eq!(h.engine.user().unwrap().card_recharges_used, 1);
}

#[test]
fn test_fourth_card_recharge_is_blocked() {
    let mut h = Harness::logged_in();
    for _ in 0..3 {
        h.engine.submit_card_payment(&card(10.0)).unwrap();
        h.advance(secs(5));
    }
    assert_eq!(h.engine.user().unwrap().card_recharges_used, 3);

    let err = h.engine.submit_card_payment(&card(10.0)).unwrap_err();

    assert_eq!(err, WalletError::LimitReached { limit: 3 });
    assert_eq!(h.engine.transactions().len(), 3);
    assert_bs(h.engine.balance().bs(), 30.0 * RATE);
}

#[test]
fn test_card_cap_counts_in_flight_payments() {
    let mut h = Harness::logged_in();
    for _ in 0..3 {
        h.engine.submit_card_payment(&card(10.0)).unwrap();
    }
    let err = h.engine.submit_card_payment(&card(10.0)).unwrap_err();
    assert!(err.is_limit_reached());
    assert_eq!(h.engine.transactions().len(), 3);
}

#[test]
fn test_saved_card_uses_shorter_delay() {
    let mut h = Harness::logged_in();
    let err = h.engine.submit_card_payment(&saved_card(10.0)).unwrap_err();
    assert_eq!(err.field(), Some("card"));

    let mut first = card(10.0);
    first.save_card = true;
    h.engine.submit_card_payment(&first).unwrap();
    h.advance(secs(4));
    assert!(h.engine.user().unwrap().has_saved_card);

    let submission = h.engine.submit_card_payment(&saved_card(10.0)).unwrap();
    assert_eq!(submission.next_step_in, Some(secs(3)));
    h.advance(secs(3));
    assert_eq!(
        h.engine.transaction(&submission.transaction_id).unwrap().status,
        TransactionStatus::Completed
    );
}

#[test]
fn test_card_details_are_checked() {
    let mut h = Harness::logged_in();

    let mut request = card(10.0);
    request.otp = "000000".to_string();
    assert_eq!(h.engine.submit_card_payment(&request).unwrap_err().field(), Some("otp"));

    let mut request = card(10.0);
    request.card.as_mut().unwrap().cvv = "123".to_string();
    assert_eq!(h.engine.submit_card_payment(&request).unwrap_err().field(), Some("cvv"));

    let mut request = card(10.0);
    request.card.as_mut().unwrap().number = "4111 1111 1111 1111".to_string();
    assert_eq!(
        h.engine.submit_card_payment(&request).unwrap_err().field(),
        Some("card_number")
    );

    let mut request = card(10.0);
    request.card.as_mut().unwrap().number = "1234".to_string();
    assert_eq!(
        h.engine.submit_card_payment(&request).unwrap_err().field(),
        Some("card_number")
    );

    assert!(h.engine.transactions().is_empty());
}

// ============================================================================
// Shared preconditions
// ============================================================================

#[test]
fn test_non_positive_amounts_are_rejected() {
    let mut h = Harness::logged_in();
    for amount in [0.0, -5.0, f64::NAN] {
        let err = h
            .engine
            .submit_mobile_payment(&mobile(amount, "REF", "4454651"))
            .unwrap_err();
        assert_eq!(err.field(), Some("amount"));
        assert!(h.engine.select_amount(amount).is_err());
    }
    assert!(h.engine.transactions().is_empty());
}

#[test]
fn test_submissions_require_a_session() {
    let mut h = Harness::registered();
    let err = h.engine.submit_card_payment(&card(10.0)).unwrap_err();
    assert_eq!(err, WalletError::NoActiveSession);
}

#[test]
fn test_selected_amount_snapshots() {
    let mut h = Harness::logged_in();
    let selected = h.engine.select_amount(25.0).unwrap();
    assert_bs(selected.bs, 25.0 * RATE);
    assert!((selected.eur - 25.0 * 0.94).abs() < 1e-9);
}
