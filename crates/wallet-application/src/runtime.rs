//! Tokio host for the engine.
//!
//! Every mutation, whether a user call or a fired timer, goes through the
//! one mutex around the engine, which gives each session a single ordered
//! mutation queue.

use crate::engine::WalletEngine;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use wallet_core::config::WalletConfig;
use wallet_core::storage::KeyValueMedium;
use wallet_infrastructure::{FiredTimer, TokioScheduler};

pub struct WalletRuntime {
    engine: Arc<Mutex<WalletEngine>>,
    driver: JoinHandle<()>,
}

impl WalletRuntime {
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: WalletConfig,
        durable: Arc<dyn KeyValueMedium>,
        session: Arc<dyn KeyValueMedium>,
    ) -> Self {
        let (scheduler, fired) = TokioScheduler::new();
        let engine = WalletEngine::new(config, durable, session, Arc::new(scheduler));
        let engine = Arc::new(Mutex::new(engine));
        let driver = tokio::spawn(Self::drive(Arc::clone(&engine), fired));
        tracing::info!("[Runtime] Started");
        Self { engine, driver }
    }

    async fn drive(engine: Arc<Mutex<WalletEngine>>, mut fired: mpsc::UnboundedReceiver<FiredTimer>) {
        while let Some(timer) = fired.recv().await {
            let mut engine = engine.lock().await;
            engine.dispatch(timer.id);
        }
        tracing::debug!("[Runtime] Timer channel closed");
    }

    pub fn engine(&self) -> Arc<Mutex<WalletEngine>> {
        Arc::clone(&self.engine)
    }

    /// Logs out (persisting everything) and stops the timer driver.
    pub async fn shutdown(self) {
        self.engine.lock().await.logout();
        self.driver.abort();
        tracing::info!("[Runtime] Stopped");
    }
}
