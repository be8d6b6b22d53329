//! The explicit application-state object every service operates on.

use crate::events::EventBus;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wallet_core::config::WalletConfig;
use wallet_core::currency::{Balance, ExchangeRates};
use wallet_core::error::{Result, WalletError};
use wallet_core::event::WalletEvent;
use wallet_core::evolution::EvolutionStage;
use wallet_core::repository::WalletRepository;
use wallet_core::scheduler::{Clock, ScheduledTask, Scheduler, TimerId};
use wallet_core::transaction::{Ledger, Transaction};
use wallet_core::user::{
    BankLinkData, CardData, PasswordStrength, RegistrationRecord, SelectedAmount, UserProfile,
};
use wallet_core::verification::VerificationRecord;
use wallet_infrastructure::SessionStore;

/// In-memory domain state of the active session.
///
/// This is the live source of truth while a user is logged in; the
/// repository only ever holds snapshots of it.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    pub user: Option<UserProfile>,
    pub ledger: Ledger,
    pub pending_bank_transfers: Vec<Transaction>,
    pub verification: VerificationRecord,
    pub registration: Option<RegistrationRecord>,
    pub password_strength: Option<PasswordStrength>,
    pub bank_link: Option<BankLinkData>,
    pub processing_start: Option<DateTime<Utc>>,
    /// Last derived stage.
    pub stage: EvolutionStage,
    pub selected_amount: Option<SelectedAmount>,
    pub last_interaction: Option<DateTime<Utc>>,
    pub last_recharge: Option<DateTime<Utc>>,
    pub last_verification: Option<DateTime<Utc>>,
}

pub struct WalletContext {
    pub config: Arc<WalletConfig>,
    pub repository: Arc<dyn WalletRepository>,
    pub session: SessionStore,
    pub scheduler: Arc<dyn Scheduler>,
    pub events: EventBus,
    pub state: DomainState,
    timers: HashMap<TimerId, ScheduledTask>,
}

impl WalletContext {
    pub fn new(
        config: Arc<WalletConfig>,
        repository: Arc<dyn WalletRepository>,
        session: SessionStore,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            config,
            repository,
            session,
            scheduler,
            events: EventBus::new(),
            state: DomainState::default(),
            timers: HashMap::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.scheduler.now()
    }

    pub fn rates(&self) -> ExchangeRates {
        self.config.exchange_rates
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.user.is_some()
    }

    pub fn user(&self) -> Result<&UserProfile> {
        self.state.user.as_ref().ok_or(WalletError::NoActiveSession)
    }

    pub fn user_mut(&mut self) -> Result<&mut UserProfile> {
        self.state.user.as_mut().ok_or(WalletError::NoActiveSession)
    }

    pub fn balance(&self) -> Balance {
        self.state
            .user
            .as_ref()
            .map(|u| u.balance)
            .unwrap_or_default()
    }

    // ============================================================================
    // Timers
    // ============================================================================

    /// Schedules `task` and tracks it so it can be cleared at logout.
    pub fn schedule(&mut self, delay: Duration, task: ScheduledTask) -> TimerId {
        let id = self.scheduler.schedule_after(delay, task.clone());
        tracing::debug!("[Context] Scheduled {} in {:?}: {:?}", id, delay, task);
        self.timers.insert(id, task);
        id
    }

    /// Claims a fired timer. `None` for timers that were cancelled or
    /// belong to a torn-down session.
    pub fn take_timer(&mut self, id: TimerId) -> Option<ScheduledTask> {
        self.timers.remove(&id)
    }

    pub fn cancel_timers_where<F>(&mut self, predicate: F)
    where
        F: Fn(&ScheduledTask) -> bool,
    {
        let doomed: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, task)| predicate(task))
            .map(|(id, _)| *id)
            .collect();
        for id in doomed {
            self.scheduler.cancel(id);
            self.timers.remove(&id);
        }
    }

    pub fn cancel_all_timers(&mut self) {
        let count = self.timers.len();
        for id in self.timers.keys() {
            self.scheduler.cancel(*id);
        }
        self.timers.clear();
        if count > 0 {
            tracing::debug!("[Context] Cleared {} timer(s)", count);
        }
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn has_timer(&self, predicate: impl Fn(&ScheduledTask) -> bool) -> bool {
        self.timers.values().any(predicate)
    }

    // ============================================================================
    // Balance and persistence helpers
    // ============================================================================

    pub fn credit(&mut self, amount_bs: f64) -> Result<Balance> {
        self.change_balance(amount_bs)
    }

    pub fn debit(&mut self, amount_bs: f64) -> Result<Balance> {
        self.change_balance(-amount_bs)
    }

    fn change_balance(&mut self, delta_bs: f64) -> Result<Balance> {
        let rates = self.rates();
        let user = self.user_mut()?;
        user.balance.credit_bs(delta_bs, &rates);
        let balance = user.balance;
        self.persist_balance();
        self.events.publish(WalletEvent::BalanceChanged { balance });
        Ok(balance)
    }

    pub fn persist_balance(&self) {
        if let Some(user) = &self.state.user {
            self.repository.save_balance(&user.balance);
            self.repository.save_profile(user);
        }
    }

    pub fn persist_card_data(&self) {
        if let Some(user) = &self.state.user {
            self.repository.save_card_data(&CardData {
                has_saved_card: user.has_saved_card,
                recharges_used: user.card_recharges_used,
                device_id: user.device_id.clone(),
            });
            self.repository.save_profile(user);
        }
    }

    pub fn persist_verification(&self) {
        self.repository.save_verification(&self.state.verification);
        self.events.publish(WalletEvent::VerificationChanged {
            status: self.state.verification.status,
        });
    }

    /// Writes every piece of session state back to the repository.
    pub fn persist_all(&self) {
        let Some(user) = &self.state.user else {
            return;
        };
        self.repository.save_profile(user);
        self.repository.save_balance(&user.balance);
        self.repository.save_ledger(&self.state.ledger);
        self.repository
            .save_pending_bank_transfers(&self.state.pending_bank_transfers);
        self.repository.save_verification(&self.state.verification);
        self.repository.save_first_recharge(user.has_made_first_recharge);
        self.repository.save_stage(self.state.stage);
        self.persist_card_data();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_infrastructure::{DurableWalletRepository, MemoryMedium, VirtualScheduler};

    fn context() -> WalletContext {
        let config = WalletConfig::default();
        let repository = DurableWalletRepository::open(Arc::new(MemoryMedium::new()), &config);
        WalletContext::new(
            Arc::new(config),
            Arc::new(repository),
            SessionStore::new(Arc::new(MemoryMedium::new())),
            Arc::new(VirtualScheduler::default()),
        )
    }

    #[test]
    fn test_timer_is_claimed_once() {
        let mut ctx = context();
        let id = ctx.schedule(Duration::from_secs(1), ScheduledTask::VerificationPoll);
        assert_eq!(ctx.take_timer(id), Some(ScheduledTask::VerificationPoll));
        assert_eq!(ctx.take_timer(id), None);
    }

    #[test]
    fn test_cancel_by_predicate() {
        let mut ctx = context();
        ctx.schedule(Duration::from_secs(1), ScheduledTask::InactivityWarning);
        ctx.schedule(Duration::from_secs(1), ScheduledTask::Reminder { hours: 1 });
        ctx.cancel_timers_where(ScheduledTask::is_reminder);
        assert_eq!(ctx.active_timers(), 1);
        assert!(ctx.has_timer(ScheduledTask::is_inactivity));

        ctx.cancel_all_timers();
        assert_eq!(ctx.active_timers(), 0);
    }

    #[test]
    fn test_balance_changes_need_a_session() {
        let mut ctx = context();
        assert_eq!(ctx.credit(100.0), Err(WalletError::NoActiveSession));

        ctx.state.user = Some(UserProfile::new("Ana Díaz", "ana@example.com", "device_a"));
        let mut rx = ctx.events.subscribe();
        let balance = ctx.credit(1382.4).unwrap();
        assert!((balance.usd() - 10.0).abs() < 1e-9);
        assert!(matches!(rx.try_recv(), Ok(WalletEvent::BalanceChanged { .. })));
    }
}
