//! Identity verification: the details step inside the wallet, and the
//! poller that watches for submissions made by the external flow.

use crate::context::WalletContext;
use crate::evolution::EvolutionManager;
use wallet_core::error::{Result, WalletError};
use wallet_core::event::{Notification, NotificationLevel};
use wallet_core::repository::Milestone;
use wallet_core::scheduler::ScheduledTask;
use wallet_core::user::validation::{validate_id_number, validate_phone_number};
use wallet_core::verification::VerificationStatus;

pub struct VerificationService;

impl VerificationService {
    /// Captures id and phone, moving `unverified -> pending`.
    pub fn submit_details(
        ctx: &mut WalletContext,
        id_number: &str,
        phone_number: &str,
    ) -> Result<VerificationStatus> {
        ctx.user()?;
        let id_number = id_number.trim().to_uppercase();
        let phone_number = phone_number.trim().to_string();
        if !validate_id_number(&id_number) {
            return Err(WalletError::validation(
                "id_number",
                "La cédula debe comenzar con V o E seguida de 7 u 8 dígitos",
            ));
        }
        if !validate_phone_number(&phone_number) {
            return Err(WalletError::validation(
                "phone_number",
                "Ingresa un número móvil venezolano válido",
            ));
        }

        let now = ctx.now();
        let record = &mut ctx.state.verification;
        record.id_number = Some(id_number.clone());
        record.phone_number = Some(phone_number.clone());
        if record.status == VerificationStatus::Unverified {
            record.transition(VerificationStatus::Pending, now);
        } else {
            record.updated_at = Some(now);
        }
        let status = record.status;

        if let Some(user) = ctx.state.user.as_mut() {
            user.id_number = Some(id_number);
            user.phone_number = Some(phone_number);
            ctx.repository.save_profile(user);
        }

        tracing::info!("[Verification] Details captured, status {}", status);
        ctx.persist_verification();
        EvolutionManager::refresh(ctx);
        Ok(status)
    }
}

/// Polls the keys written by the out-of-process verification flows.
pub struct VerificationMonitor;

impl VerificationMonitor {
    pub fn start(ctx: &mut WalletContext) {
        ctx.cancel_timers_where(|t| matches!(t, ScheduledTask::VerificationPoll));
        Self::check(ctx);
        let interval = ctx.config.timers.verification_poll();
        ctx.schedule(interval, ScheduledTask::VerificationPoll);
    }

    /// Timer entry point: check once, then re-arm.
    pub fn poll(ctx: &mut WalletContext) {
        if !ctx.is_logged_in() {
            return;
        }
        Self::check(ctx);
        let interval = ctx.config.timers.verification_poll();
        ctx.schedule(interval, ScheduledTask::VerificationPoll);
    }

    /// One pass over both external keys. Returns whether anything changed.
    pub fn check(ctx: &mut WalletContext) -> bool {
        if !ctx.is_logged_in() {
            return false;
        }
        let submitted = Self::check_submission(ctx);
        let linked = Self::check_bank_link(ctx);
        submitted || linked
    }

    /// A submission counts once: only when newer than the last-checked marker.
    fn check_submission(ctx: &mut WalletContext) -> bool {
        let Some(external) = ctx.repository.load_external_verification() else {
            return false;
        };
        let last_checked = ctx
            .repository
            .load_milestone(Milestone::LastExternalVerificationCheck);
        if last_checked.is_some_and(|last| external.submitted_at <= last) {
            return false;
        }
        ctx.repository
            .save_milestone(Milestone::LastExternalVerificationCheck, external.submitted_at);

        let status = ctx.state.verification.status;
        if !status.awaits_documents() {
            tracing::debug!(
                "[Verification] External submission ignored, status already {}",
                status
            );
            return false;
        }

        tracing::info!("[Verification] External submission detected");
        EvolutionManager::on_verification_complete(ctx);
        ctx.events.notify(Notification::new(
            NotificationLevel::Info,
            "Procesando Documentos",
            "Recibimos tu verificación. Estamos analizando tus documentos.",
        ));
        true
    }

    fn check_bank_link(ctx: &mut WalletContext) -> bool {
        let Some(link) = ctx.repository.load_external_bank_link() else {
            return false;
        };
        if ctx.state.bank_link.as_ref() == Some(&link) {
            return false;
        }
        EvolutionManager::on_bank_data_received(ctx, link);
        true
    }
}
