#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use wallet_application::{RegistrationForm, WalletEngine};
use wallet_core::config::WalletConfig;
use wallet_core::event::{Notification, WalletEvent};
use wallet_core::payment::{
    BankTransferRequest, CardDetails, CardPaymentRequest, MobilePaymentRequest, Receipt,
};
use wallet_core::scheduler::Clock;
use wallet_infrastructure::{MemoryMedium, VirtualScheduler};

pub const PASSWORD: &str = "Secreta#2024";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn registration_form() -> RegistrationForm {
    RegistrationForm {
        name: "María Pérez".to_string(),
        email: "maria@example.com".to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        accept_terms: true,
    }
}

pub fn receipt() -> Option<Receipt> {
    Some(Receipt {
        file_name: "comprobante.jpg".to_string(),
        size_bytes: 2048,
    })
}

pub fn mobile(amount_usd: f64, reference: &str, concept: &str) -> MobilePaymentRequest {
    MobilePaymentRequest {
        amount_usd,
        reference: reference.to_string(),
        concept: concept.to_string(),
        receipt: receipt(),
    }
}

pub fn bank_transfer(amount_usd: f64, reference: &str) -> BankTransferRequest {
    BankTransferRequest {
        amount_usd,
        reference: reference.to_string(),
        receipt: receipt(),
    }
}

pub fn card(amount_usd: f64) -> CardPaymentRequest {
    CardPaymentRequest {
        amount_usd,
        card: Some(CardDetails {
            number: "4745 0342 1176 3009".to_string(),
            holder: "MARIA PEREZ".to_string(),
            expiry_month: "01".to_string(),
            expiry_year: "2026".to_string(),
            cvv: "583".to_string(),
        }),
        otp: "142536".to_string(),
        save_card: false,
    }
}

pub fn saved_card(amount_usd: f64) -> CardPaymentRequest {
    CardPaymentRequest {
        amount_usd,
        card: None,
        otp: String::new(),
        save_card: false,
    }
}

/// Everything published so far, skipping over any lag.
pub fn drain(rx: &mut broadcast::Receiver<WalletEvent>) -> Vec<WalletEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

pub fn notifications(events: &[WalletEvent]) -> Vec<Notification> {
    events
        .iter()
        .filter_map(|e| match e {
            WalletEvent::Notification { notification } => Some(notification.clone()),
            _ => None,
        })
        .collect()
}

/// An engine on in-memory media driven by a virtual clock.
pub struct Harness {
    pub engine: WalletEngine,
    pub clock: Arc<VirtualScheduler>,
    pub durable: MemoryMedium,
    pub session: MemoryMedium,
}

impl Harness {
    pub fn new() -> Self {
        Self::on_media(MemoryMedium::new(), MemoryMedium::new(), start_time())
    }

    pub fn on_media(durable: MemoryMedium, session: MemoryMedium, now: DateTime<Utc>) -> Self {
        let clock = Arc::new(VirtualScheduler::new(now));
        let engine = WalletEngine::new(
            WalletConfig::default(),
            Arc::new(durable.clone()),
            Arc::new(session.clone()),
            clock.clone(),
        );
        Self {
            engine,
            clock,
            durable,
            session,
        }
    }

    /// A fresh page load over the same durable storage, `after` from now.
    /// No timer of the previous engine survives.
    pub fn reload_after(&self, after: Duration) -> Self {
        let now = self.clock.now() + chrono::Duration::from_std(after).unwrap();
        Self::on_media(self.durable.clone(), MemoryMedium::new(), now)
    }

    pub fn registered() -> Self {
        let mut harness = Self::new();
        harness.engine.register(&registration_form()).unwrap();
        harness
    }

    pub fn logged_in() -> Self {
        let mut harness = Self::registered();
        harness.login();
        harness
    }

    pub fn login(&mut self) {
        let code = self.engine.config().access.login_code.clone();
        self.engine.login(PASSWORD, &code).unwrap();
    }

    pub fn advance(&mut self, by: Duration) -> usize {
        self.engine.advance_virtual(&self.clock, by)
    }

    /// Advances while the user keeps interacting once a minute, so the
    /// inactivity watchdog never fires.
    pub fn advance_active(&mut self, by: Duration) {
        let mut left = by;
        while !left.is_zero() {
            let step = left.min(Duration::from_secs(60));
            self.advance(step);
            self.engine.record_interaction();
            left -= step;
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

pub fn mins(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}
