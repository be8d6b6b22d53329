//! Inactivity watchdog: warning, grace period, then a forced logout.

use crate::auth::AuthService;
use crate::context::WalletContext;
use crate::evolution::EvolutionManager;
use wallet_core::event::{SessionEndReason, WalletEvent};
use wallet_core::repository::Milestone;
use wallet_core::scheduler::ScheduledTask;

pub struct InactivityWatchdog;

impl InactivityWatchdog {
    /// Any user action. Re-arms the warning and the reminder schedule.
    pub fn record_interaction(ctx: &mut WalletContext) {
        if !ctx.is_logged_in() {
            return;
        }
        let now = ctx.now();
        ctx.state.last_interaction = Some(now);
        ctx.repository.save_milestone(Milestone::LastInteraction, now);

        ctx.cancel_timers_where(ScheduledTask::is_inactivity);
        let warn_after = ctx.config.timers.inactivity_warning_after();
        ctx.schedule(warn_after, ScheduledTask::InactivityWarning);
        EvolutionManager::schedule_reminders(ctx);
    }

    pub fn on_warning(ctx: &mut WalletContext) {
        let grace = ctx.config.timers.inactivity_grace();
        tracing::info!("[Watchdog] Inactive, logging out in {:?}", grace);
        ctx.events
            .publish(WalletEvent::InactivityWarning { logout_in: grace });
        ctx.schedule(grace, ScheduledTask::InactivityLogout);
    }

    pub fn on_logout(ctx: &mut WalletContext) {
        tracing::info!("[Watchdog] Session expired");
        AuthService::logout(ctx, SessionEndReason::Inactivity);
    }
}
