use super::{new_deposit, require_positive_amount, require_receipt, require_text};
use crate::context::WalletContext;
use crate::evolution::EvolutionManager;
use crate::ledger::LedgerManager;
use wallet_core::error::Result;
use wallet_core::event::{Notification, NotificationLevel};
use wallet_core::payment::{BankTransferRequest, Submission};
use wallet_core::scheduler::ScheduledTask;
use wallet_core::transaction::{PaymentMethod, TransactionStatus};

/// Bank transfers end in `pending` and wait for back-office reconciliation.
/// Nothing here ever credits the balance.
pub struct BankTransferValidator;

impl BankTransferValidator {
    pub fn submit(ctx: &mut WalletContext, request: &BankTransferRequest) -> Result<Submission> {
        ctx.user()?;
        require_positive_amount(request.amount_usd)?;
        let reference = require_text(
            &request.reference,
            "reference",
            "Ingresa el número de referencia",
        )?
        .to_string();
        require_receipt(request.receipt.as_ref())?;

        let mut tx = new_deposit(
            ctx,
            PaymentMethod::BankTransfer,
            request.amount_usd,
            "Transferencia bancaria",
        );
        tx.reference = Some(reference);
        let id = tx.id.clone();
        LedgerManager::append(ctx, tx);

        let delay = ctx.config.timers.bank_transfer_delay();
        ctx.schedule(
            delay,
            ScheduledTask::BankTransferRegister {
                transaction_id: id.clone(),
            },
        );
        tracing::info!("[BankTransfer] {} submitted", id);
        EvolutionManager::on_user_recharge(ctx);

        Ok(Submission {
            transaction_id: id,
            status: TransactionStatus::Processing,
            next_step_in: Some(delay),
        })
    }

    /// `processing -> pending`, queued for reconciliation.
    pub fn register(ctx: &mut WalletContext, transaction_id: &str) {
        let Some(tx) = LedgerManager::update(ctx, transaction_id, |t| {
            t.status = TransactionStatus::Pending;
        }) else {
            return;
        };

        ctx.state.pending_bank_transfers.push(tx.clone());
        ctx.repository
            .save_pending_bank_transfers(&ctx.state.pending_bank_transfers);

        tracing::info!("[BankTransfer] {} registered, awaiting reconciliation", transaction_id);
        ctx.events.notify(Notification::new(
            NotificationLevel::Info,
            "Transferencia en proceso",
            format!(
                "Tu transferencia de ${:.2} fue registrada y está siendo verificada.",
                tx.amount
            ),
        ));
        EvolutionManager::refresh(ctx);
    }
}
