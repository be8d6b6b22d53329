//! Deposit pipelines. Each submission validates synchronously, records a
//! `processing` transaction, then advances through scheduled steps.

pub mod bank_transfer;
pub mod card;
pub mod mobile;

pub use bank_transfer::BankTransferValidator;
pub use card::CardPaymentValidator;
pub use mobile::MobilePaymentValidator;

use crate::context::WalletContext;
use wallet_core::error::{Result, WalletError};
use wallet_core::payment::Receipt;
use wallet_core::scheduler::ScheduledTask;
use wallet_core::transaction::{PaymentMethod, Transaction, TransactionKind, TransactionStatus};
use wallet_core::user::SelectedAmount;

pub(crate) fn require_positive_amount(amount_usd: f64) -> Result<()> {
    if amount_usd.is_finite() && amount_usd > 0.0 {
        Ok(())
    } else {
        Err(WalletError::validation("amount", "Selecciona un monto válido"))
    }
}

pub(crate) fn require_text<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(WalletError::validation(field, message))
    } else {
        Ok(trimmed)
    }
}

pub(crate) fn require_receipt(receipt: Option<&Receipt>) -> Result<()> {
    match receipt {
        Some(r) if !r.file_name.trim().is_empty() => Ok(()),
        _ => Err(WalletError::validation(
            "receipt",
            "Adjunta el comprobante de pago",
        )),
    }
}

/// A fresh `processing` deposit with amount snapshots taken now.
pub(crate) fn new_deposit(
    ctx: &WalletContext,
    method: PaymentMethod,
    amount_usd: f64,
    description: &str,
) -> Transaction {
    let now = ctx.now();
    let amount = SelectedAmount::from_usd(amount_usd, &ctx.rates());
    Transaction {
        id: Transaction::generate_id(method.id_prefix(), now),
        kind: TransactionKind::Deposit,
        method: Some(method),
        amount: amount.usd,
        amount_bs: amount.bs,
        amount_eur: amount.eur,
        reference: None,
        concept: None,
        description: description.to_string(),
        destination: None,
        card_label: None,
        status: TransactionStatus::Processing,
        created_at: now,
        approved_at: None,
        rejected_at: None,
        rejection_reason: None,
        balance_snapshot: None,
    }
}

/// Re-attaches in-flight deposits after a login, so nothing created in an
/// earlier session stays stuck between steps.
pub fn resume_in_flight(ctx: &mut WalletContext) {
    let mut tasks = Vec::new();
    for tx in ctx.state.ledger.transactions() {
        let transaction_id = tx.id.clone();
        let step = match (tx.method, tx.status) {
            (Some(PaymentMethod::Card), TransactionStatus::Processing) => Some((
                ctx.config.timers.card_delay(false),
                ScheduledTask::CardPaymentResolve {
                    transaction_id,
                    save_card: false,
                },
            )),
            (Some(PaymentMethod::BankTransfer), TransactionStatus::Processing) => Some((
                ctx.config.timers.bank_transfer_delay(),
                ScheduledTask::BankTransferRegister { transaction_id },
            )),
            (Some(PaymentMethod::MobilePayment), TransactionStatus::Processing) => Some((
                ctx.config.mobile_payment.processing_delay(),
                ScheduledTask::MobilePaymentValidate { transaction_id },
            )),
            (Some(PaymentMethod::MobilePayment), TransactionStatus::PendingReview) => Some((
                ctx.config.mobile_payment.rejection_delay(),
                ScheduledTask::MobilePaymentReject { transaction_id },
            )),
            _ => None,
        };
        tasks.extend(step);
    }
    if !tasks.is_empty() {
        tracing::info!("[Payments] Resuming {} in-flight transaction(s)", tasks.len());
    }
    for (delay, task) in tasks {
        ctx.schedule(delay, task);
    }
}
