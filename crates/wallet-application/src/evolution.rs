//! Onboarding state machine.
//!
//! The stage itself is always derived; this manager owns the hooks that
//! mutate its inputs, the document-processing window timers and the
//! redraw-only reminders.

use crate::context::WalletContext;
use std::time::Duration;
use wallet_core::event::{Notification, NotificationLevel, WalletEvent};
use wallet_core::evolution::copy;
use wallet_core::evolution::reminder::hours_since;
use wallet_core::evolution::{
    DocumentStage, EvolutionStage, ProcessingWindow, StageInputs, StageView, derive_stage,
};
use wallet_core::repository::Milestone;
use wallet_core::scheduler::ScheduledTask;
use wallet_core::transaction::Transaction;
use wallet_core::user::BankLinkData;
use wallet_core::verification::VerificationStatus;

pub struct EvolutionManager;

impl EvolutionManager {
    pub fn processing_window(ctx: &WalletContext) -> Option<ProcessingWindow> {
        ctx.state
            .processing_start
            .map(|start| ProcessingWindow::new(start, ctx.config.timers.processing_duration()))
    }

    pub fn derive(ctx: &WalletContext) -> EvolutionStage {
        let Some(profile) = &ctx.state.user else {
            return EvolutionStage::FirstRecharge;
        };
        derive_stage(&StageInputs {
            profile,
            verification: &ctx.state.verification,
            ledger: &ctx.state.ledger,
            processing_window: Self::processing_window(ctx),
            bank_link: ctx.state.bank_link.as_ref(),
            now: ctx.now(),
            mobile_onboarding_min_usd: ctx.config.mobile_payment.onboarding_min_amount_usd,
        })
    }

    /// Recomputes the stage, caching it as a hint for the next load.
    ///
    /// An expired processing window is completed first, so a cold load
    /// after the window elapsed lands on the verified stage directly.
    pub fn refresh(ctx: &mut WalletContext) -> EvolutionStage {
        Self::check_processing_complete(ctx);

        let stage = Self::derive(ctx);
        let previous = ctx.state.stage;
        if stage != previous {
            tracing::info!("[Evolution] Stage {} -> {}", previous, stage);
            ctx.state.stage = stage;
            ctx.events.publish(WalletEvent::StageChanged {
                from: previous,
                to: stage,
            });
        }
        if ctx.is_logged_in() {
            ctx.repository.save_stage(stage);
        }
        let view = Self::view(ctx);
        ctx.events.publish(WalletEvent::StageRefreshed { view });
        stage
    }

    pub fn view(ctx: &WalletContext) -> StageView {
        let stage = ctx.state.stage;
        let now = ctx.now();
        let first_name = ctx
            .state
            .user
            .as_ref()
            .map(|u| u.first_name().to_string())
            .unwrap_or_default();
        let window = Self::processing_window(ctx).filter(|w| w.is_active(now));

        let message = match stage {
            EvolutionStage::FirstRecharge => copy::first_recharge_message().to_string(),
            EvolutionStage::NeedsVerification => copy::verification_message(
                hours_since(ctx.state.last_recharge, now),
                &first_name,
            ),
            EvolutionStage::ProcessingDocs => window
                .map(|w| w.remaining_text(now))
                .unwrap_or_else(|| "Finalizando...".to_string()),
            EvolutionStage::ReadyForBanking => copy::banking_message(
                hours_since(ctx.state.last_verification, now),
                &first_name,
                ctx.state.bank_link.as_ref().map(|b| b.name.as_str()),
            ),
            EvolutionStage::BankingValidated => copy::banking_validated_message().to_string(),
            EvolutionStage::FirstMobilePayment => copy::mobile_payment_message().to_string(),
        };

        let processing = stage == EvolutionStage::ProcessingDocs;
        StageView {
            stage,
            title: copy::stage_title(stage).to_string(),
            message,
            progress_percent: window.filter(|_| processing).map(|w| w.progress_percent(now)),
            remaining: window.filter(|_| processing).map(|w| w.remaining_text(now)),
            document_stage: window
                .filter(|_| processing)
                .and_then(|w| DocumentStage::at(w.elapsed(now), &ctx.config.timers.document_stages))
                .map(|(s, _)| s),
        }
    }

    // ============================================================================
    // Hooks
    // ============================================================================

    pub fn on_user_recharge(ctx: &mut WalletContext) {
        let now = ctx.now();
        let Some(user) = ctx.state.user.as_mut() else {
            return;
        };
        if !user.has_made_first_recharge {
            tracing::info!("[Evolution] First recharge recorded");
        }
        user.has_made_first_recharge = true;
        ctx.repository.save_first_recharge(true);
        ctx.state.last_recharge = Some(now);
        ctx.repository.save_milestone(Milestone::LastRecharge, now);
        Self::refresh(ctx);
    }

    /// Starts the document-processing window. A window that is still open
    /// keeps its original start.
    pub fn on_verification_complete(ctx: &mut WalletContext) {
        let status = ctx.state.verification.status;
        if !(status.awaits_documents() || status == VerificationStatus::Processing) {
            tracing::debug!("[Evolution] Verification already {}, window not started", status);
            return;
        }

        let now = ctx.now();
        if Self::processing_window(ctx).is_some_and(|w| w.is_active(now)) {
            tracing::debug!("[Evolution] Document processing already under way");
            return;
        }
        if ctx.state.verification.transition(VerificationStatus::Processing, now) {
            ctx.persist_verification();
        }
        ctx.state.processing_start = Some(now);
        ctx.repository.save_processing_start(now);
        ctx.state.last_verification = Some(now);
        ctx.repository.save_milestone(Milestone::LastVerification, now);
        tracing::info!("[Evolution] Document processing window opened");

        ctx.cancel_timers_where(ScheduledTask::is_document_analysis);
        let duration = ctx.config.timers.processing_duration();
        ctx.schedule(duration, ScheduledTask::ProcessingWindowExpired);
        Self::schedule_document_stage(ctx);
        Self::refresh(ctx);
    }

    pub fn on_bank_data_received(ctx: &mut WalletContext, data: BankLinkData) {
        tracing::info!("[Evolution] Bank link received: {}", data.name);
        if !ctx.repository.save_bank_link(&data) {
            tracing::debug!("[Evolution] Bank link kept in memory only");
        }
        ctx.state.bank_link = Some(data);
        Self::refresh(ctx);
    }

    pub fn on_mobile_payment_submitted(ctx: &mut WalletContext, payment: &Transaction) {
        tracing::info!(
            "[Evolution] Mobile payment {} submitted (${:.2})",
            payment.id,
            payment.amount
        );
        Self::on_user_recharge(ctx);
    }

    // ============================================================================
    // Processing window
    // ============================================================================

    /// Completes verification once the window has elapsed. Clearing the
    /// stored start timestamp makes this fire exactly once.
    pub fn check_processing_complete(ctx: &mut WalletContext) -> bool {
        let now = ctx.now();
        let Some(window) = Self::processing_window(ctx) else {
            return false;
        };
        if window.is_active(now) {
            return false;
        }

        ctx.state.processing_start = None;
        ctx.repository.clear_processing_start();
        ctx.cancel_timers_where(ScheduledTask::is_document_analysis);

        let status = ctx.state.verification.status;
        if matches!(
            status,
            VerificationStatus::Verified
                | VerificationStatus::BankValidation
                | VerificationStatus::BankValidated
        ) {
            return false;
        }

        ctx.state.verification.transition(VerificationStatus::Verified, now);
        ctx.persist_verification();
        tracing::info!("[Evolution] Document processing complete, verification verified");
        ctx.events.notify(Notification::new(
            NotificationLevel::Success,
            "Verificación completada",
            "Tus documentos fueron aprobados. Ya puedes validar tu cuenta bancaria.",
        ));
        true
    }

    /// Re-attaches to a window that was open when the previous session ended.
    pub fn resume(ctx: &mut WalletContext) {
        let now = ctx.now();
        let Some(window) = Self::processing_window(ctx) else {
            return;
        };
        if window.is_expired(now) {
            Self::check_processing_complete(ctx);
            return;
        }
        tracing::info!(
            "[Evolution] Resuming document processing ({}%)",
            window.progress_percent(now)
        );
        ctx.cancel_timers_where(ScheduledTask::is_document_analysis);
        ctx.schedule(window.remaining(now), ScheduledTask::ProcessingWindowExpired);
        Self::schedule_document_stage(ctx);
    }

    /// Publishes progress for the current analysis stage and arms the next.
    /// Always re-derived from the stored start timestamp.
    pub fn schedule_document_stage(ctx: &mut WalletContext) {
        let now = ctx.now();
        let Some(window) = Self::processing_window(ctx).filter(|w| w.is_active(now)) else {
            return;
        };
        let stages = &ctx.config.timers.document_stages;
        let Some((stage, left)) = DocumentStage::at(window.elapsed(now), stages) else {
            return;
        };
        ctx.events.publish(WalletEvent::DocumentAnalysisProgress {
            stage,
            progress_percent: window.progress_percent(now),
        });

        let next = DocumentStage::ORDER
            .iter()
            .skip_while(|s| **s != stage)
            .nth(1)
            .copied();
        if let Some(next) = next {
            ctx.schedule(left, ScheduledTask::DocumentStage { stage: next });
        }
    }

    // ============================================================================
    // Reminders
    // ============================================================================

    /// Re-arms the redraw reminders relative to the last interaction.
    pub fn schedule_reminders(ctx: &mut WalletContext) {
        ctx.cancel_timers_where(ScheduledTask::is_reminder);
        let now = ctx.now();
        let since = ctx.state.last_interaction.unwrap_or(now);
        let hours: Vec<u32> = ctx.config.timers.reminder_hours.clone();
        for h in hours {
            let due = since + chrono::Duration::hours(i64::from(h));
            if let Ok(delay) = (due - now).to_std() {
                if delay > Duration::ZERO {
                    ctx.schedule(delay, ScheduledTask::Reminder { hours: h });
                }
            }
        }
    }

    pub fn on_reminder(ctx: &mut WalletContext, hours: u32) {
        tracing::debug!("[Evolution] {}h reminder", hours);
        Self::refresh(ctx);
    }
}
