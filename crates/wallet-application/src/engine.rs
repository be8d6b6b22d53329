//! Wallet engine facade.
//!
//! `WalletEngine` owns the [`WalletContext`] and exposes every user-facing
//! operation plus the timer dispatch entry point. It is
//! synchronous: a host either drives it with a [`VirtualScheduler`] (tests,
//! replays) or wraps it in the tokio [`WalletRuntime`](crate::WalletRuntime).

use crate::auth::{AuthService, RegistrationForm};
use crate::context::WalletContext;
use crate::evolution::EvolutionManager;
use crate::ledger::LedgerManager;
use crate::payment::{BankTransferValidator, CardPaymentValidator, MobilePaymentValidator};
use crate::sync::CrossPageSync;
use crate::verification::{VerificationMonitor, VerificationService};
use crate::watchdog::InactivityWatchdog;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use wallet_core::config::WalletConfig;
use wallet_core::currency::Balance;
use wallet_core::error::Result;
use wallet_core::event::{SessionEndReason, WalletEvent};
use wallet_core::evolution::{EvolutionStage, StageView};
use wallet_core::payment::{
    BankTransferRequest, CardPaymentRequest, MobilePaymentRequest, ReconcileOutcome, Submission,
};
use wallet_core::repository::WalletRepository;
use wallet_core::scheduler::{Clock, ScheduledTask, Scheduler, TimerId};
use wallet_core::storage::KeyValueMedium;
use wallet_core::transaction::{Transaction, TransferIntent};
use wallet_core::user::{BankLinkData, RegistrationRecord, SelectedAmount, UserProfile};
use wallet_core::verification::{VerificationRecord, VerificationStatus};
use wallet_infrastructure::{DurableWalletRepository, SessionStore, VirtualScheduler};

/// Serializable summary of the engine state, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStats {
    pub registered: bool,
    pub logged_in: bool,
    pub device_id: String,
    pub balance: Balance,
    pub transactions: usize,
    pub pending_transactions: usize,
    pub pending_bank_transfers: usize,
    pub card_recharges_used: u32,
    pub card_recharges_limit: u32,
    pub verification_status: VerificationStatus,
    pub stage: EvolutionStage,
    pub exchange_rate: f64,
    pub storage_available: bool,
    pub storage_version: String,
    pub active_timers: usize,
}

pub struct WalletEngine {
    ctx: WalletContext,
}

impl WalletEngine {
    /// Builds an engine over the given media. Corrupted records are purged
    /// before anything reads them.
    pub fn new(
        config: WalletConfig,
        durable: Arc<dyn KeyValueMedium>,
        session: Arc<dyn KeyValueMedium>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let repository = DurableWalletRepository::open(durable, &config);
        Self::with_repository(
            config,
            Arc::new(repository),
            SessionStore::new(session),
            scheduler,
        )
    }

    pub fn with_repository(
        config: WalletConfig,
        repository: Arc<dyn WalletRepository>,
        session: SessionStore,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let purged = repository.purge_corrupted();
        if purged > 0 {
            tracing::warn!("[Engine] Purged {} corrupted record(s)", purged);
        }
        Self {
            ctx: WalletContext::new(Arc::new(config), repository, session, scheduler),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.ctx.events.subscribe()
    }

    pub fn context(&self) -> &WalletContext {
        &self.ctx
    }

    pub fn config(&self) -> &WalletConfig {
        &self.ctx.config
    }

    // ============================================================================
    // Session
    // ============================================================================

    pub fn register(&mut self, form: &RegistrationForm) -> Result<RegistrationRecord> {
        AuthService::register(&mut self.ctx, form)
    }

    pub fn login(&mut self, password: &str, access_code: &str) -> Result<UserProfile> {
        AuthService::login(&mut self.ctx, password, access_code)
    }

    pub fn logout(&mut self) {
        AuthService::logout(&mut self.ctx, SessionEndReason::Logout);
    }

    pub fn update_credentials(&mut self, email: &str, password: &str) -> Result<RegistrationRecord> {
        AuthService::update_credentials(&mut self.ctx, email, password)
    }

    pub fn is_logged_in(&self) -> bool {
        self.ctx.is_logged_in()
    }

    /// Any user action; keeps the inactivity watchdog from firing.
    pub fn record_interaction(&mut self) {
        InactivityWatchdog::record_interaction(&mut self.ctx);
    }

    // ============================================================================
    // Deposits and ledger
    // ============================================================================

    pub fn select_amount(&mut self, amount_usd: f64) -> Result<SelectedAmount> {
        AuthService::select_amount(&mut self.ctx, amount_usd)
    }

    pub fn submit_card_payment(&mut self, request: &CardPaymentRequest) -> Result<Submission> {
        self.record_interaction();
        CardPaymentValidator::submit(&mut self.ctx, request)
    }

    pub fn submit_bank_transfer(&mut self, request: &BankTransferRequest) -> Result<Submission> {
        self.record_interaction();
        BankTransferValidator::submit(&mut self.ctx, request)
    }

    pub fn submit_mobile_payment(&mut self, request: &MobilePaymentRequest) -> Result<Submission> {
        self.record_interaction();
        MobilePaymentValidator::submit(&mut self.ctx, request)
    }

    /// Back-office settlement of a pending transfer or withdrawal.
    pub fn reconcile(&mut self, transaction_id: &str, outcome: ReconcileOutcome) -> Result<Transaction> {
        LedgerManager::reconcile(&mut self.ctx, transaction_id, outcome)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.ctx.state.ledger.transactions()
    }

    pub fn transaction(&self, id: &str) -> Option<Transaction> {
        LedgerManager::get(&self.ctx, id)
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        LedgerManager::pending(&self.ctx)
    }

    pub fn pending_bank_transfers(&self) -> &[Transaction] {
        &self.ctx.state.pending_bank_transfers
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.ctx.state.user.as_ref()
    }

    pub fn balance(&self) -> Balance {
        self.ctx.balance()
    }

    // ============================================================================
    // Verification and onboarding
    // ============================================================================

    pub fn submit_verification_details(
        &mut self,
        id_number: &str,
        phone_number: &str,
    ) -> Result<VerificationStatus> {
        VerificationService::submit_details(&mut self.ctx, id_number, phone_number)
    }

    /// The verification flow finished; opens the document-processing window.
    pub fn complete_verification(&mut self) {
        EvolutionManager::on_verification_complete(&mut self.ctx);
    }

    pub fn receive_bank_data(&mut self, data: BankLinkData) {
        EvolutionManager::on_bank_data_received(&mut self.ctx, data);
    }

    /// One immediate pass of the external verification poller.
    pub fn check_external_verification(&mut self) -> bool {
        VerificationMonitor::check(&mut self.ctx)
    }

    pub fn verification(&self) -> &VerificationRecord {
        &self.ctx.state.verification
    }

    pub fn stage(&self) -> EvolutionStage {
        self.ctx.state.stage
    }

    pub fn refresh_stage(&mut self) -> EvolutionStage {
        EvolutionManager::refresh(&mut self.ctx)
    }

    pub fn stage_view(&self) -> StageView {
        EvolutionManager::view(&self.ctx)
    }

    // ============================================================================
    // Cross-page
    // ============================================================================

    pub fn prepare_transfer_handoff(&self) -> bool {
        CrossPageSync::prepare_transfer_handoff(&self.ctx)
    }

    pub fn write_transfer_intent(&self, intent: &TransferIntent) -> bool {
        CrossPageSync::write_transfer_intent(&self.ctx, intent)
    }

    pub fn consume_transfer_intent(&mut self) -> Option<Transaction> {
        CrossPageSync::consume_transfer_intent(&mut self.ctx)
    }

    pub fn sync_before_navigation(&self) -> bool {
        CrossPageSync::sync_before_navigation(&self.ctx)
    }

    pub fn restore_after_navigation(&mut self) -> bool {
        CrossPageSync::restore_after_navigation(&mut self.ctx)
    }

    pub fn on_external_change(&mut self, key: &str) {
        CrossPageSync::on_external_change(&mut self.ctx, key);
    }

    // ============================================================================
    // Timers
    // ============================================================================

    /// Runs a fired timer. Timers this engine no longer tracks (cancelled,
    /// or scheduled by a session that has since ended) are dropped.
    pub fn dispatch(&mut self, id: TimerId) -> bool {
        let Some(task) = self.ctx.take_timer(id) else {
            tracing::debug!("[Engine] Ignoring untracked {}", id);
            return false;
        };
        tracing::debug!("[Engine] Dispatching {}: {:?}", id, task);
        self.run_task(task);
        true
    }

    fn run_task(&mut self, task: ScheduledTask) {
        let ctx = &mut self.ctx;
        match task {
            ScheduledTask::CardPaymentResolve {
                transaction_id,
                save_card,
            } => CardPaymentValidator::resolve(ctx, &transaction_id, save_card),
            ScheduledTask::BankTransferRegister { transaction_id } => {
                BankTransferValidator::register(ctx, &transaction_id)
            }
            ScheduledTask::MobilePaymentValidate { transaction_id } => {
                MobilePaymentValidator::validate(ctx, &transaction_id)
            }
            ScheduledTask::MobilePaymentReject { transaction_id } => {
                MobilePaymentValidator::reject(ctx, &transaction_id)
            }
            ScheduledTask::ProcessingWindowExpired => {
                EvolutionManager::refresh(ctx);
            }
            ScheduledTask::DocumentStage { .. } => EvolutionManager::schedule_document_stage(ctx),
            ScheduledTask::Reminder { hours } => EvolutionManager::on_reminder(ctx, hours),
            ScheduledTask::InactivityWarning => InactivityWatchdog::on_warning(ctx),
            ScheduledTask::InactivityLogout => InactivityWatchdog::on_logout(ctx),
            ScheduledTask::VerificationPoll => VerificationMonitor::poll(ctx),
        }
    }

    /// Moves a virtual clock forward by `by`, dispatching every timer that
    /// comes due on the way, in due order. Returns how many ran.
    pub fn advance_virtual(&mut self, clock: &VirtualScheduler, by: Duration) -> usize {
        let step = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        let target = clock.now() + step;
        let mut ran = 0;
        while let Some((id, _)) = clock.pop_due(target) {
            if self.dispatch(id) {
                ran += 1;
            }
        }
        clock.set_now(target);
        ran
    }

    pub fn stats(&self) -> SystemStats {
        let ctx = &self.ctx;
        let user = ctx.state.user.as_ref();
        SystemStats {
            registered: ctx.repository.is_registered(),
            logged_in: ctx.is_logged_in(),
            device_id: ctx.repository.device_id(),
            balance: ctx.balance(),
            transactions: ctx.state.ledger.len(),
            pending_transactions: ctx.state.ledger.pending_count(),
            pending_bank_transfers: ctx.state.pending_bank_transfers.len(),
            card_recharges_used: user.map(|u| u.card_recharges_used).unwrap_or_default(),
            card_recharges_limit: ctx.config.card.max_recharges,
            verification_status: ctx.state.verification.status,
            stage: ctx.state.stage,
            exchange_rate: ctx.rates().usd_to_bs,
            storage_available: ctx.repository.is_available(),
            storage_version: ctx.repository.storage_version(),
            active_timers: ctx.active_timers(),
        }
    }
}
