mod common;

use common::*;
use std::sync::Arc;
use wallet_application::WalletRuntime;
use wallet_core::config::WalletConfig;
use wallet_core::transaction::TransactionStatus;
use wallet_infrastructure::MemoryMedium;

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_runtime_drives_payment_timers() {
    let durable = MemoryMedium::new();
    let runtime = WalletRuntime::start(
        WalletConfig::default(),
        Arc::new(durable.clone()),
        Arc::new(MemoryMedium::new()),
    );
    let engine = runtime.engine();

    let id = {
        let mut engine = engine.lock().await;
        engine.register(&registration_form()).unwrap();
        let code = engine.config().access.login_code.clone();
        engine.login(PASSWORD, &code).unwrap();
        engine
            .submit_mobile_payment(&mobile(30.0, "REF1", "4454651"))
            .unwrap()
            .transaction_id
    };

    tokio::time::sleep(secs(10)).await;
    settle().await;
    assert_eq!(
        engine.lock().await.transaction(&id).unwrap().status,
        TransactionStatus::Processing
    );

    tokio::time::sleep(secs(6)).await;
    settle().await;
    assert_eq!(
        engine.lock().await.transaction(&id).unwrap().status,
        TransactionStatus::Completed
    );

    runtime.shutdown().await;
    assert!(!engine.lock().await.is_logged_in());
}

#[tokio::test(start_paused = true)]
async fn test_runtime_enforces_inactivity_logout() {
    let runtime = WalletRuntime::start(
        WalletConfig::default(),
        Arc::new(MemoryMedium::new()),
        Arc::new(MemoryMedium::new()),
    );
    let engine = runtime.engine();
    {
        let mut engine = engine.lock().await;
        engine.register(&registration_form()).unwrap();
        let code = engine.config().access.login_code.clone();
        engine.login(PASSWORD, &code).unwrap();
    }

    tokio::time::sleep(mins(5) + secs(1)).await;
    settle().await;

    assert!(!engine.lock().await.is_logged_in());
    runtime.shutdown().await;
}
