//! Registration, login and logout against the single local credential record.

use crate::context::{DomainState, WalletContext};
use crate::evolution::EvolutionManager;
use crate::payment;
use crate::sync::CrossPageSync;
use crate::verification::VerificationMonitor;
use crate::watchdog::InactivityWatchdog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wallet_core::error::{Result, WalletError};
use wallet_core::event::{SessionEndReason, WalletEvent};
use wallet_core::repository::Milestone;
use wallet_core::user::validation::{validate_email, validate_name};
use wallet_core::user::{PasswordStrength, RegistrationRecord, SelectedAmount, UserProfile};
use wallet_infrastructure::keys::session as session_keys;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

/// Summary written to the session store at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub name: String,
    pub email: String,
    pub device_id: String,
    pub logged_in_at: DateTime<Utc>,
}

pub struct AuthService;

impl AuthService {
    pub fn register(ctx: &mut WalletContext, form: &RegistrationForm) -> Result<RegistrationRecord> {
        let name = form.name.trim();
        let email = form.email.trim();
        if !validate_name(name) {
            return Err(WalletError::validation(
                "name",
                "Ingresa tu nombre y apellido (solo letras)",
            ));
        }
        if !validate_email(email) {
            return Err(WalletError::validation("email", "Correo electrónico inválido"));
        }
        let strength = PasswordStrength::evaluate(&form.password);
        if !strength.is_acceptable() {
            return Err(WalletError::validation("password", strength.level.label()));
        }
        if form.password != form.confirm_password {
            return Err(WalletError::validation(
                "confirm_password",
                "Las contraseñas no coinciden",
            ));
        }
        if !form.accept_terms {
            return Err(WalletError::validation(
                "accept_terms",
                "Debes aceptar los términos y condiciones",
            ));
        }
        if Self::registration(ctx).is_ok() {
            return Err(WalletError::validation(
                "email",
                "Este dispositivo ya tiene una cuenta registrada",
            ));
        }

        let record = RegistrationRecord {
            name: name.to_string(),
            email: email.to_string(),
            password: form.password.clone(),
            registered_at: ctx.now(),
            is_registered: true,
        };
        ctx.repository.save_registration(&record);
        let profile = UserProfile::new(name, email, ctx.repository.device_id());
        ctx.repository.save_profile(&profile);
        ctx.repository.save_balance(&profile.balance);

        ctx.state.registration = Some(record.clone());
        ctx.state.password_strength = Some(strength);
        tracing::info!("[Auth] Registered {}", record.email);
        Ok(record)
    }

    /// Edits the stored credentials from the login screen.
    pub fn update_credentials(
        ctx: &mut WalletContext,
        email: &str,
        password: &str,
    ) -> Result<RegistrationRecord> {
        let mut record = Self::registration(ctx)?;

        let email = email.trim();
        if !validate_email(email) {
            return Err(WalletError::validation("email", "Correo electrónico inválido"));
        }
        let strength = PasswordStrength::evaluate(password);
        if !strength.is_acceptable() {
            return Err(WalletError::validation("password", strength.level.label()));
        }

        record.email = email.to_string();
        record.password = password.to_string();
        ctx.repository.save_registration(&record);
        if let Some(user) = ctx.state.user.as_mut() {
            user.email = record.email.clone();
            ctx.repository.save_profile(user);
        }
        ctx.state.registration = Some(record.clone());
        ctx.state.password_strength = Some(strength);
        tracing::info!("[Auth] Credentials updated");
        Ok(record)
    }

    pub fn login(ctx: &mut WalletContext, password: &str, access_code: &str) -> Result<UserProfile> {
        let record = Self::registration(ctx)?;
        if record.password != password {
            return Err(WalletError::authentication("Contraseña incorrecta"));
        }
        if access_code.trim() != ctx.config.access.login_code {
            return Err(WalletError::authentication("Código de acceso inválido"));
        }
        if let Some(user) = &ctx.state.user {
            tracing::debug!("[Auth] {} already logged in", user.email);
            return Ok(user.clone());
        }

        Self::hydrate(ctx, record);
        let user = ctx.user()?.clone();
        ctx.session.set_active();
        ctx.session.set_json(
            session_keys::USER,
            &SessionUser {
                name: user.name.clone(),
                email: user.email.clone(),
                device_id: user.device_id.clone(),
                logged_in_at: ctx.now(),
            },
        );
        ctx.session.set_str(session_keys::DEVICE_ID, &user.device_id);
        tracing::info!("[Auth] {} logged in", user.email);

        Self::activate(ctx);
        CrossPageSync::consume_transfer_intent(ctx);
        Ok(user)
    }

    /// The stored record, or the in-memory one when the store is unavailable.
    fn registration(ctx: &WalletContext) -> Result<RegistrationRecord> {
        ctx.repository
            .load_registration()
            .or_else(|| ctx.state.registration.clone())
            .filter(|r| r.is_registered)
            .ok_or_else(|| WalletError::authentication("No hay una cuenta registrada"))
    }

    /// Loads every device-scoped record into a fresh domain state.
    pub(crate) fn hydrate(ctx: &mut WalletContext, registration: RegistrationRecord) {
        let repo = &ctx.repository;
        let rates = ctx.config.exchange_rates;

        let mut user = repo.load_profile().unwrap_or_else(|| {
            UserProfile::new(&registration.name, &registration.email, repo.device_id())
        });
        if let Some(balance) = repo.load_balance() {
            user.balance = balance;
        }
        user.balance = user.balance.normalized(&rates);
        if let Some(card) = repo.load_card_data() {
            user.has_saved_card = card.has_saved_card;
            user.card_recharges_used = card.recharges_used;
        }
        user.has_made_first_recharge |= repo.load_first_recharge();

        let verification = repo.load_verification().unwrap_or_default();
        ctx.state = DomainState {
            user: Some(user),
            ledger: repo.load_ledger(),
            pending_bank_transfers: repo.load_pending_bank_transfers(),
            verification,
            password_strength: Some(PasswordStrength::evaluate(&registration.password)),
            registration: Some(registration),
            bank_link: repo.load_bank_link(),
            processing_start: repo.load_processing_start(),
            stage: repo.load_stage().unwrap_or_default(),
            selected_amount: None,
            last_interaction: repo.load_milestone(Milestone::LastInteraction),
            last_recharge: repo.load_milestone(Milestone::LastRecharge),
            last_verification: repo.load_milestone(Milestone::LastVerification),
        };
    }

    /// Starts the timers of a live session.
    pub(crate) fn activate(ctx: &mut WalletContext) {
        EvolutionManager::resume(ctx);
        payment::resume_in_flight(ctx);
        EvolutionManager::refresh(ctx);
        InactivityWatchdog::record_interaction(ctx);
        VerificationMonitor::start(ctx);
    }

    /// Persists everything, then tears the session down. Timers scheduled
    /// for this session never fire into the next one.
    pub fn logout(ctx: &mut WalletContext, reason: SessionEndReason) {
        if !ctx.is_logged_in() {
            return;
        }
        ctx.persist_all();
        ctx.cancel_all_timers();
        ctx.session.clear();
        ctx.state = DomainState {
            registration: ctx.state.registration.take(),
            ..DomainState::default()
        };
        tracing::info!("[Auth] Session ended ({})", reason);
        ctx.events.publish(WalletEvent::SessionEnded { reason });
    }

    pub fn select_amount(ctx: &mut WalletContext, amount_usd: f64) -> Result<SelectedAmount> {
        ctx.user()?;
        payment::require_positive_amount(amount_usd)?;
        let selected = SelectedAmount::from_usd(amount_usd, &ctx.rates());
        ctx.state.selected_amount = Some(selected);
        Ok(selected)
    }
}
