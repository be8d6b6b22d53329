//! Cross-page hand-off through the session store, and reloading state
//! written behind the engine's back.

use crate::auth::{AuthService, SessionUser};
use crate::context::WalletContext;
use crate::evolution::EvolutionManager;
use crate::ledger::LedgerManager;
use crate::verification::VerificationMonitor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wallet_core::currency::Balance;
use wallet_core::event::{Notification, NotificationLevel, WalletEvent};
use wallet_core::transaction::{
    BalanceSnapshot, Transaction, TransactionKind, TransactionStatus, TransferIntent,
};
use wallet_core::user::{RegistrationRecord, SelectedAmount, UserProfile};
use wallet_core::verification::VerificationRecord;
use wallet_infrastructure::keys::{durable as durable_keys, session as session_keys};

const WITHDRAWAL_PREFIX: &str = "TR_";

/// State carried across a page navigation inside the same session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossPageSnapshot {
    pub user: UserProfile,
    pub verification: VerificationRecord,
    #[serde(default)]
    pub registration: Option<RegistrationRecord>,
    pub saved_at: DateTime<Utc>,
}

pub struct CrossPageSync;

impl CrossPageSync {
    /// Balance, rate and device id for the withdrawal page.
    pub fn prepare_transfer_handoff(ctx: &WalletContext) -> bool {
        let Ok(user) = ctx.user() else {
            return false;
        };
        let balance_ok = ctx.session.set_json(session_keys::BALANCE, &user.balance);
        let rate_ok = ctx.session.set_str(
            session_keys::EXCHANGE_RATE,
            &ctx.rates().usd_to_bs.to_string(),
        );
        let device_ok = ctx.session.set_str(session_keys::DEVICE_ID, &user.device_id);
        balance_ok && rate_ok && device_ok
    }

    /// What the withdrawal page writes before navigating back.
    pub fn write_transfer_intent(ctx: &WalletContext, intent: &TransferIntent) -> bool {
        ctx.session.set_json(session_keys::TRANSFER_DATA, intent)
    }

    /// Turns a pending transfer intent into a `pending` withdrawal. The
    /// payload is removed on read, so it is consumed at most once.
    pub fn consume_transfer_intent(ctx: &mut WalletContext) -> Option<Transaction> {
        if !ctx.is_logged_in() {
            return None;
        }
        let intent: TransferIntent = ctx.session.take_json(session_keys::TRANSFER_DATA)?;
        if !(intent.amount.is_finite() && intent.amount > 0.0) {
            tracing::warn!("[Sync] Ignoring transfer intent with amount {}", intent.amount);
            return None;
        }

        let now = ctx.now();
        let amount = SelectedAmount::from_usd(intent.amount, &ctx.rates());
        let before = ctx.balance().bs();
        let tx = Transaction {
            id: Transaction::generate_id(WITHDRAWAL_PREFIX, now),
            kind: TransactionKind::Withdraw,
            method: None,
            amount: amount.usd,
            amount_bs: amount.bs,
            amount_eur: amount.eur,
            reference: None,
            concept: None,
            description: format!("Retiro a {}", intent.destination_bank),
            destination: Some(intent.destination_bank.clone()),
            card_label: None,
            status: TransactionStatus::Pending,
            created_at: now,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
            balance_snapshot: Some(BalanceSnapshot {
                balance_before: before,
                balance_after: before - amount.bs,
            }),
        };

        LedgerManager::append(ctx, tx.clone());
        ctx.state.pending_bank_transfers.push(tx.clone());
        ctx.repository
            .save_pending_bank_transfers(&ctx.state.pending_bank_transfers);

        tracing::info!("[Sync] Withdrawal {} to {} queued", tx.id, intent.destination_bank);
        ctx.events.notify(Notification::new(
            NotificationLevel::Info,
            "Retiro Procesado",
            format!(
                "Tu retiro de ${:.2} a {} está en proceso.",
                tx.amount, intent.destination_bank
            ),
        ));
        Some(tx)
    }

    pub fn sync_before_navigation(ctx: &WalletContext) -> bool {
        let Ok(user) = ctx.user() else {
            return false;
        };
        ctx.persist_all();
        let snapshot = CrossPageSnapshot {
            user: user.clone(),
            verification: ctx.state.verification.clone(),
            registration: ctx.state.registration.clone(),
            saved_at: ctx.now(),
        };
        ctx.session.set_json(session_keys::CROSS_PAGE, &snapshot)
            && ctx.session.set_str(session_keys::INTERNAL_NAVIGATION, "true")
    }

    /// Resumes the session on the destination page without a new login.
    /// Durable records win over the snapshot wherever both exist.
    pub fn restore_after_navigation(ctx: &mut WalletContext) -> bool {
        if ctx.is_logged_in() || !ctx.session.is_active() {
            return false;
        }
        if ctx.session.get_str(session_keys::INTERNAL_NAVIGATION).as_deref() != Some("true") {
            return false;
        }
        ctx.session.remove(session_keys::INTERNAL_NAVIGATION);
        let Some(snapshot) = ctx.session.take_json::<CrossPageSnapshot>(session_keys::CROSS_PAGE)
        else {
            return false;
        };
        if snapshot.user.device_id != ctx.repository.device_id() {
            tracing::warn!("[Sync] Snapshot belongs to another device, not restoring");
            return false;
        }
        let Some(registration) = snapshot
            .registration
            .clone()
            .or_else(|| ctx.repository.load_registration())
        else {
            return false;
        };

        AuthService::hydrate(ctx, registration);
        if ctx.repository.load_profile().is_none() {
            ctx.state.user = Some(snapshot.user.clone());
        }
        if ctx.repository.load_verification().is_none() {
            ctx.state.verification = snapshot.verification.clone();
        }
        ctx.session.set_json(
            session_keys::USER,
            &SessionUser {
                name: snapshot.user.name.clone(),
                email: snapshot.user.email.clone(),
                device_id: snapshot.user.device_id.clone(),
                logged_in_at: snapshot.saved_at,
            },
        );
        tracing::info!("[Sync] Session restored after navigation");
        AuthService::activate(ctx);
        Self::consume_transfer_intent(ctx);
        true
    }

    /// Reloads whatever another writer changed under `key`.
    pub fn on_external_change(ctx: &mut WalletContext, key: &str) {
        if !ctx.is_logged_in() {
            return;
        }
        match key {
            durable_keys::BALANCE | durable_keys::USER_DATA => Self::reload_balance(ctx),
            durable_keys::TRANSACTIONS | durable_keys::PENDING_BANK_TRANSFERS => {
                Self::reload_ledger(ctx)
            }
            durable_keys::VERIFICATION_STATUS => Self::reload_verification(ctx),
            durable_keys::VERIFICATION_BANKING | durable_keys::BANK_VALIDATION_DATA => {
                VerificationMonitor::check(ctx);
            }
            other => tracing::debug!("[Sync] No reaction to change of '{}'", other),
        }
    }

    fn reload_balance(ctx: &mut WalletContext) {
        let Some(stored) = ctx.repository.load_balance() else {
            return;
        };
        let rates = ctx.rates();
        let Some(user) = ctx.state.user.as_mut() else {
            return;
        };
        let stored = Balance::from_bs(stored.bs(), &rates);
        if user.balance == stored {
            return;
        }
        user.balance = stored;
        tracing::info!("[Sync] Balance reloaded: {:.2} Bs", stored.bs());
        ctx.events.publish(WalletEvent::BalanceChanged { balance: stored });
    }

    fn reload_ledger(ctx: &mut WalletContext) {
        let stored = ctx.repository.load_ledger();
        let added = ctx.state.ledger.merge(&stored);
        let pending = ctx.repository.load_pending_bank_transfers();
        for tx in pending {
            if !ctx.state.pending_bank_transfers.iter().any(|t| t.id == tx.id) {
                ctx.state.pending_bank_transfers.push(tx);
            }
        }
        if added == 0 {
            return;
        }
        tracing::info!("[Sync] Merged {} out-of-band transaction(s)", added);
        ctx.repository.save_ledger(&ctx.state.ledger);
        ctx.events.publish(WalletEvent::LedgerChanged {
            transaction_id: None,
            pending: ctx.state.ledger.pending_count(),
            total: ctx.state.ledger.len(),
        });
        EvolutionManager::refresh(ctx);
    }

    fn reload_verification(ctx: &mut WalletContext) {
        let Some(stored) = ctx.repository.load_verification() else {
            return;
        };
        if stored == ctx.state.verification {
            return;
        }
        let status = stored.status;
        ctx.state.verification = stored;
        tracing::info!("[Sync] Verification reloaded: {}", status);
        ctx.events
            .publish(WalletEvent::VerificationChanged { status });
        EvolutionManager::refresh(ctx);
    }
}
