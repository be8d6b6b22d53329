use super::{new_deposit, require_positive_amount, require_receipt, require_text};
use crate::context::WalletContext;
use crate::evolution::EvolutionManager;
use crate::ledger::LedgerManager;
use wallet_core::error::Result;
use wallet_core::event::{Notification, NotificationAction, NotificationLevel};
use wallet_core::evolution::copy::rejected_payment_support_message;
use wallet_core::payment::{ConceptMatcher, MobilePaymentRequest, Submission};
use wallet_core::scheduler::ScheduledTask;
use wallet_core::transaction::{BalanceSnapshot, PaymentMethod, TransactionStatus};

/// Mobile payments: concept matching after a validation delay, then either
/// approval or review followed by rejection.
pub struct MobilePaymentValidator;

impl MobilePaymentValidator {
    pub fn submit(ctx: &mut WalletContext, request: &MobilePaymentRequest) -> Result<Submission> {
        ctx.user()?;
        require_positive_amount(request.amount_usd)?;
        let reference = require_text(
            &request.reference,
            "reference",
            "Ingresa el número de referencia",
        )?
        .to_string();
        let concept = require_text(&request.concept, "concept", "Ingresa el concepto del pago")?
            .to_string();
        require_receipt(request.receipt.as_ref())?;

        let mut tx = new_deposit(
            ctx,
            PaymentMethod::MobilePayment,
            request.amount_usd,
            "Pago móvil",
        );
        tx.reference = Some(reference);
        tx.concept = Some(concept);
        let id = tx.id.clone();
        LedgerManager::append(ctx, tx.clone());

        let delay = ctx.config.mobile_payment.processing_delay();
        ctx.schedule(
            delay,
            ScheduledTask::MobilePaymentValidate {
                transaction_id: id.clone(),
            },
        );
        tracing::info!("[MobilePayment] {} submitted, validating in {:?}", id, delay);
        EvolutionManager::on_mobile_payment_submitted(ctx, &tx);

        Ok(Submission {
            transaction_id: id,
            status: TransactionStatus::Processing,
            next_step_in: Some(delay),
        })
    }

    fn matcher(ctx: &WalletContext) -> ConceptMatcher {
        ConceptMatcher::new(&ctx.config.mobile_payment.accepted_concepts)
    }

    pub fn validate(ctx: &mut WalletContext, transaction_id: &str) {
        let Some(tx) = LedgerManager::get(ctx, transaction_id) else {
            tracing::warn!("[MobilePayment] {} not found", transaction_id);
            return;
        };
        if tx.status != TransactionStatus::Processing {
            tracing::warn!("[MobilePayment] {} is {}, skipping validation", transaction_id, tx.status);
            return;
        }

        let concept = tx.concept.clone().unwrap_or_default();
        if Self::matcher(ctx).matches(&concept) {
            Self::approve(ctx, transaction_id, tx.amount_bs, tx.amount);
        } else {
            Self::send_to_review(ctx, transaction_id, &concept);
        }
    }

    fn approve(ctx: &mut WalletContext, transaction_id: &str, amount_bs: f64, amount_usd: f64) {
        let before = ctx.balance().bs();
        let balance = match ctx.credit(amount_bs) {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("[MobilePayment] {} left processing: {}", transaction_id, e);
                return;
            }
        };
        let now = ctx.now();
        LedgerManager::update(ctx, transaction_id, |t| {
            t.complete(now);
            t.balance_snapshot = Some(BalanceSnapshot {
                balance_before: before,
                balance_after: balance.bs(),
            });
        });

        tracing::info!("[MobilePayment] {} approved (+{:.2} Bs)", transaction_id, amount_bs);
        ctx.events.notify(Notification::new(
            NotificationLevel::Success,
            "Pago móvil aprobado",
            format!("Se acreditaron ${:.2} a tu cuenta.", amount_usd),
        ));
        EvolutionManager::on_user_recharge(ctx);
    }

    fn send_to_review(ctx: &mut WalletContext, transaction_id: &str, concept: &str) {
        LedgerManager::update(ctx, transaction_id, |t| {
            t.status = TransactionStatus::PendingReview;
        });
        tracing::info!(
            "[MobilePayment] {} concept '{}' did not match, under review",
            transaction_id,
            concept
        );

        let delay = ctx.config.mobile_payment.rejection_delay();
        ctx.schedule(
            delay,
            ScheduledTask::MobilePaymentReject {
                transaction_id: transaction_id.to_string(),
            },
        );
        ctx.events.notify(Notification::new(
            NotificationLevel::Warning,
            "Pago en revisión",
            "Estamos revisando los datos de tu pago móvil.",
        ));
        EvolutionManager::refresh(ctx);
    }

    /// Terminal rejection. The user must resubmit as a new transaction.
    pub fn reject(ctx: &mut WalletContext, transaction_id: &str) {
        let Some(tx) = LedgerManager::get(ctx, transaction_id) else {
            tracing::warn!("[MobilePayment] {} not found", transaction_id);
            return;
        };
        if tx.status != TransactionStatus::PendingReview {
            tracing::warn!("[MobilePayment] {} is {}, not rejecting", transaction_id, tx.status);
            return;
        }

        let now = ctx.now();
        let reason = ctx.config.mobile_payment.rejection_reason.clone();
        let rejected = LedgerManager::update(ctx, transaction_id, |t| t.reject(now, reason.clone()));
        if let Some(err) = rejected.as_ref().and_then(|t| t.rejection_error()) {
            tracing::info!("[MobilePayment] {}: {}", transaction_id, err);
        }

        let reference = tx.reference.unwrap_or_default();
        let canonical = ctx.config.mobile_payment.canonical_concept.clone();
        ctx.events.notify(
            Notification::new(
                NotificationLevel::Error,
                "Pago móvil rechazado",
                format!(
                    "{}. Vuelve a enviar tu pago usando exactamente el concepto: {}",
                    reason, canonical
                ),
            )
            .with_action(NotificationAction::Resubmit { concept: canonical })
            .with_action(NotificationAction::ContactSupport {
                phone: ctx.config.support.whatsapp_phone.clone(),
                message: rejected_payment_support_message(&reference),
            }),
        );
        EvolutionManager::refresh(ctx);
    }
}
