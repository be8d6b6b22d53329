use super::{Environment, print_event};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use wallet_application::{RegistrationForm, WalletEngine, WalletRuntime};
use wallet_core::WalletError;
use wallet_core::event::WalletEvent;
use wallet_core::payment::{
    BankTransferRequest, CardDetails, CardPaymentRequest, MobilePaymentRequest, Receipt,
};
use wallet_infrastructure::MemoryMedium;

pub struct Account {
    pub name: String,
    pub email: String,
    pub password: String,
}

fn receipt() -> Option<Receipt> {
    Some(Receipt {
        file_name: "comprobante.jpg".to_string(),
        size_bytes: 48_213,
    })
}

fn flush(rx: &mut broadcast::Receiver<WalletEvent>) {
    while let Ok(event) = rx.try_recv() {
        print_event(&event);
    }
}

/// Registers on first use, then logs in.
fn sign_in(engine: &mut WalletEngine, account: &Account) -> Result<()> {
    if !engine.stats().registered {
        engine.register(&RegistrationForm {
            name: account.name.clone(),
            email: account.email.clone(),
            password: account.password.clone(),
            confirm_password: account.password.clone(),
            accept_terms: true,
        })?;
        println!("registered {}", account.email);
    }
    let code = engine.config().access.login_code.clone();
    engine.login(&account.password, &code)?;
    Ok(())
}

/// Whole flow against a virtual clock; finishes immediately.
pub fn run(env: &Environment, account: &Account) -> Result<()> {
    let (mut engine, clock) = env.virtual_engine()?;
    let mut rx = engine.subscribe();
    sign_in(&mut engine, account)?;
    flush(&mut rx);

    let canonical = engine.config().mobile_payment.canonical_concept.clone();
    let steps: [(&str, MobilePaymentRequest); 2] = [
        (
            "mobile payment, accepted concept",
            MobilePaymentRequest {
                amount_usd: 30.0,
                reference: "DEMO-MP-1".to_string(),
                concept: canonical,
                receipt: receipt(),
            },
        ),
        (
            "mobile payment, wrong concept",
            MobilePaymentRequest {
                amount_usd: 30.0,
                reference: "DEMO-MP-2".to_string(),
                concept: "pago".to_string(),
                receipt: receipt(),
            },
        ),
    ];
    for (label, request) in steps {
        println!("== {}", label);
        let submission = engine.submit_mobile_payment(&request)?;
        println!("submitted {}", submission.transaction_id);
        engine.advance_virtual(&clock, Duration::from_secs(50));
        flush(&mut rx);
    }

    println!("== bank transfer");
    let submission = engine.submit_bank_transfer(&BankTransferRequest {
        amount_usd: 50.0,
        reference: "DEMO-BT-1".to_string(),
        receipt: receipt(),
    })?;
    engine.advance_virtual(&clock, Duration::from_secs(5));
    println!("{} left pending for reconciliation", submission.transaction_id);
    flush(&mut rx);

    println!("== card recharge");
    let card = engine.config().card.clone();
    let otp = engine.config().access.otp_code.clone();
    let request = CardPaymentRequest {
        amount_usd: 20.0,
        card: Some(CardDetails {
            number: card.number,
            holder: account.name.to_uppercase(),
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            cvv: card.cvv,
        }),
        otp,
        save_card: true,
    };
    match engine.submit_card_payment(&request) {
        Ok(submission) => println!("submitted {}", submission.transaction_id),
        Err(WalletError::LimitReached { limit }) => println!("card limit of {} reached", limit),
        Err(e) => return Err(e.into()),
    }
    engine.advance_virtual(&clock, Duration::from_secs(5));
    flush(&mut rx);

    println!("== verification");
    match engine.submit_verification_details("V12345678", "04141234567") {
        Ok(status) => println!("verification {}", status),
        Err(WalletError::Validation { message, .. }) => println!("skipped: {}", message),
        Err(e) => return Err(e.into()),
    }
    engine.complete_verification();
    for _ in 0..11 {
        engine.advance_virtual(&clock, Duration::from_secs(60));
        engine.record_interaction();
    }
    flush(&mut rx);

    println!("{}", serde_json::to_string_pretty(&engine.stats())?);
    engine.logout();
    flush(&mut rx);
    Ok(())
}

/// One accepted mobile payment on real tokio timers.
pub async fn run_realtime(env: &Environment, account: &Account) -> Result<()> {
    let runtime = WalletRuntime::start(
        env.config.clone(),
        env.durable_medium()?,
        Arc::new(MemoryMedium::new()),
    );
    let engine = runtime.engine();

    let (mut rx, wait) = {
        let mut engine = engine.lock().await;
        let rx = engine.subscribe();
        sign_in(&mut engine, account)?;
        let concept = engine.config().mobile_payment.canonical_concept.clone();
        let submission = engine.submit_mobile_payment(&MobilePaymentRequest {
            amount_usd: 30.0,
            reference: "DEMO-RT-1".to_string(),
            concept,
            receipt: receipt(),
        })?;
        let wait = submission
            .next_step_in
            .ok_or_else(|| anyhow!("submission has no scheduled step"))?;
        println!("submitted {}, resolving in {:?}", submission.transaction_id, wait);
        (rx, wait)
    };

    let deadline = tokio::time::Instant::now() + wait + Duration::from_secs(1);
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(event)) => print_event(&event),
            Ok(Err(broadcast::error::RecvError::Lagged(n))) => {
                tracing::warn!("dropped {} event(s)", n);
            }
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => break,
        }
    }

    println!("{}", serde_json::to_string_pretty(&engine.lock().await.stats())?);
    runtime.shutdown().await;
    Ok(())
}
