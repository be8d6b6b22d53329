use super::{new_deposit, require_positive_amount};
use crate::context::WalletContext;
use crate::evolution::EvolutionManager;
use crate::ledger::LedgerManager;
use wallet_core::error::{Result, WalletError};
use wallet_core::event::{Notification, NotificationLevel};
use wallet_core::payment::{CardDetails, CardPaymentRequest, Submission};
use wallet_core::scheduler::ScheduledTask;
use wallet_core::transaction::{BalanceSnapshot, PaymentMethod, TransactionStatus};
use wallet_core::user::validation::{normalize_card_number, validate_card_number};

/// Card deposits: always approved after the progress delay, capped at a
/// fixed number of recharges.
pub struct CardPaymentValidator;

impl CardPaymentValidator {
    pub fn submit(ctx: &mut WalletContext, request: &CardPaymentRequest) -> Result<Submission> {
        let user = ctx.user()?;
        require_positive_amount(request.amount_usd)?;

        let limit = ctx.config.card.max_recharges;
        let used = user.card_recharges_used as usize + ctx.state.ledger.in_flight(PaymentMethod::Card);
        if used >= limit as usize {
            tracing::info!("[CardPayment] Recharge limit reached ({}/{})", used, limit);
            return Err(WalletError::LimitReached { limit });
        }

        let saved_card = match &request.card {
            None if user.has_saved_card => true,
            None => {
                return Err(WalletError::validation(
                    "card",
                    "No tienes una tarjeta guardada",
                ));
            }
            Some(details) => {
                Self::validate_details(ctx, details, &request.otp)?;
                false
            }
        };

        let mut tx = new_deposit(ctx, PaymentMethod::Card, request.amount_usd, "Recarga con tarjeta");
        tx.card_label = Some(ctx.config.card.masked_label.clone());
        let id = tx.id.clone();
        LedgerManager::append(ctx, tx);

        let delay = ctx.config.timers.card_delay(saved_card);
        ctx.schedule(
            delay,
            ScheduledTask::CardPaymentResolve {
                transaction_id: id.clone(),
                save_card: request.save_card && !saved_card,
            },
        );
        tracing::info!("[CardPayment] {} submitted, resolving in {:?}", id, delay);

        Ok(Submission {
            transaction_id: id,
            status: TransactionStatus::Processing,
            next_step_in: Some(delay),
        })
    }

    fn validate_details(ctx: &WalletContext, card: &CardDetails, otp: &str) -> Result<()> {
        let expected = &ctx.config.card;
        if !validate_card_number(&card.number, &expected.number) {
            return Err(WalletError::validation("card_number", "Número de tarjeta inválido"));
        }
        if normalize_card_number(&card.number) != expected.number {
            return Err(WalletError::validation(
                "card_number",
                "Tarjeta no autorizada para recargas",
            ));
        }
        if card.holder.trim().is_empty() {
            return Err(WalletError::validation("holder", "Ingresa el nombre del titular"));
        }
        if card.expiry_month.trim() != expected.expiry_month
            || card.expiry_year.trim() != expected.expiry_year
        {
            return Err(WalletError::validation("expiry", "Fecha de vencimiento inválida"));
        }
        if card.cvv.trim() != expected.cvv {
            return Err(WalletError::validation("cvv", "CVV inválido"));
        }
        if otp.trim() != ctx.config.access.otp_code {
            return Err(WalletError::validation("otp", "Código OTP inválido"));
        }
        Ok(())
    }

    /// Terminal step: credit the snapshot amount and count the recharge.
    pub fn resolve(ctx: &mut WalletContext, transaction_id: &str, save_card: bool) {
        let Some(tx) = LedgerManager::get(ctx, transaction_id) else {
            tracing::warn!("[CardPayment] {} vanished before approval", transaction_id);
            return;
        };
        if tx.status != TransactionStatus::Processing {
            tracing::warn!("[CardPayment] {} is {}, not approving", transaction_id, tx.status);
            return;
        }

        let before = ctx.balance().bs();
        let balance = match ctx.credit(tx.amount_bs) {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("[CardPayment] {} left pending: {}", transaction_id, e);
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

        if let Ok(user) = ctx.user_mut() {
            user.card_recharges_used += 1;
            if save_card {
                user.has_saved_card = true;
            }
        }
        ctx.persist_card_data();

        tracing::info!("[CardPayment] {} approved (+{:.2} Bs)", transaction_id, tx.amount_bs);
        ctx.events.notify(Notification::new(
            NotificationLevel::Success,
            "Recarga exitosa",
            format!("Se acreditaron ${:.2} a tu cuenta.", tx.amount),
        ));
        EvolutionManager::on_user_recharge(ctx);
    }
}
