//! Transaction ledger manager.

use crate::context::WalletContext;
use wallet_core::error::{Result, WalletError};
use wallet_core::event::{Notification, NotificationLevel, WalletEvent};
use wallet_core::payment::ReconcileOutcome;
use wallet_core::transaction::{BalanceSnapshot, Transaction, TransactionKind, TransactionStatus};

pub struct LedgerManager;

impl LedgerManager {
    /// Inserts at the head, persists and republishes the pending set.
    pub fn append(ctx: &mut WalletContext, transaction: Transaction) {
        let id = transaction.id.clone();
        tracing::info!(
            "[Ledger] Appending {} ({} {:?}, {})",
            id,
            transaction.kind,
            transaction.method,
            transaction.status
        );
        ctx.state.ledger.prepend(transaction);
        Self::persist_and_publish(ctx, Some(id));
    }

    /// Mutates a transaction in place. Unknown ids and settled transactions
    /// are logged and left alone.
    pub fn update<F>(ctx: &mut WalletContext, id: &str, mutate: F) -> Option<Transaction>
    where
        F: FnOnce(&mut Transaction),
    {
        let updated = match ctx.state.ledger.get(id) {
            None => {
                tracing::warn!("[Ledger] Transaction {} not found, update skipped", id);
                return None;
            }
            Some(tx) if tx.is_terminal() => {
                tracing::warn!(
                    "[Ledger] Transaction {} is already {}, update skipped",
                    id,
                    tx.status
                );
                return None;
            }
            Some(_) => ctx.state.ledger.update(id, mutate).cloned(),
        };
        if let Some(tx) = &updated {
            tracing::info!("[Ledger] {} -> {}", id, tx.status);
            Self::persist_and_publish(ctx, Some(id.to_string()));
        }
        updated
    }

    pub fn get(ctx: &WalletContext, id: &str) -> Option<Transaction> {
        ctx.state.ledger.get(id).cloned()
    }

    pub fn pending(ctx: &WalletContext) -> Vec<Transaction> {
        ctx.state.ledger.pending().cloned().collect()
    }

    /// Back-office settlement of a `pending` bank transfer or withdrawal.
    /// Never triggered by a timer.
    pub fn reconcile(
        ctx: &mut WalletContext,
        id: &str,
        outcome: ReconcileOutcome,
    ) -> Result<Transaction> {
        ctx.user()?;
        let tx = ctx
            .state
            .ledger
            .get(id)
            .cloned()
            .ok_or_else(|| WalletError::not_found("transaction", id))?;
        if tx.status != TransactionStatus::Pending {
            return Err(WalletError::validation(
                "status",
                format!("Solo se pueden conciliar transacciones pendientes ({})", tx.status),
            ));
        }

        let now = ctx.now();
        let settled = match outcome {
            ReconcileOutcome::Approve => {
                let before = ctx.balance().bs();
                let balance = match tx.kind {
                    TransactionKind::Deposit => ctx.credit(tx.amount_bs)?,
                    TransactionKind::Withdraw => ctx.debit(tx.amount_bs)?,
                };
                let settled = Self::update(ctx, id, |t| {
                    t.complete(now);
                    t.balance_snapshot = Some(BalanceSnapshot {
                        balance_before: before,
                        balance_after: balance.bs(),
                    });
                });
                ctx.events.notify(Notification::new(
                    NotificationLevel::Success,
                    "Operación conciliada",
                    format!("La operación {} fue aprobada.", id),
                ));
                settled
            }
            ReconcileOutcome::Reject { reason } => {
                let settled = Self::update(ctx, id, |t| t.reject(now, reason.clone()));
                ctx.events.notify(Notification::new(
                    NotificationLevel::Error,
                    "Operación rechazada",
                    reason,
                ));
                settled
            }
        };

        ctx.state.pending_bank_transfers.retain(|t| t.id != id);
        ctx.repository
            .save_pending_bank_transfers(&ctx.state.pending_bank_transfers);

        settled.ok_or_else(|| WalletError::internal(format!("transaction {} could not be settled", id)))
    }

    fn persist_and_publish(ctx: &mut WalletContext, transaction_id: Option<String>) {
        if !ctx.repository.save_ledger(&ctx.state.ledger) {
            tracing::debug!("[Ledger] Ledger kept in memory only");
        }
        ctx.events.publish(WalletEvent::LedgerChanged {
            transaction_id,
            pending: ctx.state.ledger.pending_count(),
            total: ctx.state.ledger.len(),
        });
    }
}
