pub mod demo;
pub mod inspect;

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use wallet_application::WalletEngine;
use wallet_core::config::WalletConfig;
use wallet_core::event::WalletEvent;
use wallet_infrastructure::paths::WalletPaths;
use wallet_infrastructure::{FileMedium, MemoryMedium, VirtualScheduler};

/// Resolved data directory and configuration for one invocation.
pub struct Environment {
    pub data_dir: PathBuf,
    pub config: WalletConfig,
}

impl Environment {
    pub fn load(data_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => WalletPaths::store_dir().context("cannot resolve the data directory")?,
        };
        let config_path = match config {
            Some(path) => path,
            None => WalletPaths::config_file().context("cannot resolve the config file")?,
        };
        let config = WalletConfig::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;
        tracing::debug!("[Config] Using data dir {}", data_dir.display());
        Ok(Self { data_dir, config })
    }

    pub fn durable_medium(&self) -> Result<Arc<FileMedium>> {
        let medium = FileMedium::open(self.data_dir.clone())
            .with_context(|| format!("opening store at {}", self.data_dir.display()))?;
        Ok(Arc::new(medium))
    }

    /// An engine over the file store, driven by a virtual clock that starts now.
    pub fn virtual_engine(&self) -> Result<(WalletEngine, Arc<VirtualScheduler>)> {
        let clock = Arc::new(VirtualScheduler::new(Utc::now()));
        let engine = WalletEngine::new(
            self.config.clone(),
            self.durable_medium()?,
            Arc::new(MemoryMedium::new()),
            clock.clone(),
        );
        Ok((engine, clock))
    }
}

pub fn print_event(event: &WalletEvent) {
    match event {
        WalletEvent::StageRefreshed { .. } | WalletEvent::LedgerChanged { .. } => {}
        other => match serde_json::to_string(other) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("cannot print event: {}", e),
        },
    }
}
