//! Engine configuration, loadable from TOML.
//!
//! Every field is optional in the file; missing values fall back to the
//! defaults the wallet shipped with.

use crate::currency::ExchangeRates;
use crate::error::{Result, WalletError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct WalletConfig {
    pub exchange_rates: ExchangeRates,
    pub access: AccessConfig,
    pub card: CardConfig,
    pub mobile_payment: MobilePaymentConfig,
    pub timers: TimerConfig,
    pub support: SupportConfig,
    pub storage: StorageConfig,
}

impl WalletConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WalletError::config(e.to_string()))
    }

    /// Loads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("[Config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| WalletError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AccessConfig {
    pub login_code: String,
    pub otp_code: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            login_code: "03768410847504996421".to_string(),
            otp_code: "142536".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CardConfig {
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub max_recharges: u32,
    pub masked_label: String,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            number: "4745034211763009".to_string(),
            expiry_month: "01".to_string(),
            expiry_year: "2026".to_string(),
            cvv: "583".to_string(),
            max_recharges: 3,
            masked_label: "****3009".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MobilePaymentConfig {
    pub accepted_concepts: Vec<String>,
    pub canonical_concept: String,
    pub processing_delay_ms: u64,
    pub rejection_delay_ms: u64,
    pub onboarding_min_amount_usd: f64,
    pub rejection_reason: String,
}

impl Default for MobilePaymentConfig {
    fn default() -> Self {
        Self {
            accepted_concepts: vec![
                "4454651".to_string(),
                "04454651".to_string(),
                "REMEEX4454651".to_string(),
                "4454651REMEEX".to_string(),
            ],
            canonical_concept: "4454651".to_string(),
            processing_delay_ms: 15_000,
            rejection_delay_ms: 30_000,
            onboarding_min_amount_usd: 25.0,
            rejection_reason: "Concepto de pago no coincide con el requerido".to_string(),
        }
    }
}

impl MobilePaymentConfig {
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn rejection_delay(&self) -> Duration {
        Duration::from_millis(self.rejection_delay_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    pub card_delay_ms: u64,
    pub saved_card_delay_ms: u64,
    pub bank_transfer_delay_ms: u64,
    pub processing_duration_ms: u64,
    pub reminder_hours: Vec<u32>,
    pub inactivity_timeout_ms: u64,
    pub inactivity_warning_ms: u64,
    pub verification_poll_ms: u64,
    pub document_stages: DocumentStageConfig,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            card_delay_ms: 4_000,
            saved_card_delay_ms: 3_000,
            bank_transfer_delay_ms: 3_000,
            processing_duration_ms: 10 * 60 * 1000,
            reminder_hours: vec![1, 3, 6, 12, 24],
            inactivity_timeout_ms: 300_000,
            inactivity_warning_ms: 30_000,
            verification_poll_ms: 30_000,
            document_stages: DocumentStageConfig::default(),
        }
    }
}

impl TimerConfig {
    pub fn card_delay(&self, saved_card: bool) -> Duration {
        Duration::from_millis(if saved_card {
            self.saved_card_delay_ms
        } else {
            self.card_delay_ms
        })
    }

    pub fn bank_transfer_delay(&self) -> Duration {
        Duration::from_millis(self.bank_transfer_delay_ms)
    }

    pub fn processing_duration(&self) -> Duration {
        Duration::from_millis(self.processing_duration_ms)
    }

    /// Delay from the last interaction until the warning is raised.
    pub fn inactivity_warning_after(&self) -> Duration {
        Duration::from_millis(
            self.inactivity_timeout_ms
                .saturating_sub(self.inactivity_warning_ms),
        )
    }

    pub fn inactivity_grace(&self) -> Duration {
        Duration::from_millis(self.inactivity_warning_ms)
    }

    pub fn verification_poll(&self) -> Duration {
        Duration::from_millis(self.verification_poll_ms)
    }
}

/// Durations of the three document-analysis stages shown while the
/// processing window is open.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DocumentStageConfig {
    pub personal_ms: u64,
    pub banking_ms: u64,
    pub biometric_ms: u64,
}

impl Default for DocumentStageConfig {
    fn default() -> Self {
        Self {
            personal_ms: 3 * 60 * 1000,
            banking_ms: 4 * 60 * 1000,
            biometric_ms: 3 * 60 * 1000,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SupportConfig {
    pub whatsapp_phone: String,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            whatsapp_phone: "+17373018059".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_version: String,
    pub encoding_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_version: "4.0".to_string(),
            encoding_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = WalletConfig::default();
        assert_eq!(config.exchange_rates.usd_to_bs, 138.24);
        assert_eq!(config.card.max_recharges, 3);
        assert_eq!(config.mobile_payment.accepted_concepts.len(), 4);
        assert_eq!(config.timers.reminder_hours, vec![1, 3, 6, 12, 24]);
        assert_eq!(
            config.timers.inactivity_warning_after(),
            Duration::from_millis(270_000)
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WalletConfig::from_toml_str(
            r#"
            [exchange_rates]
            usd_to_bs = 100.0

            [timers]
            card_delay_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.exchange_rates.usd_to_bs, 100.0);
        assert_eq!(config.exchange_rates.usd_to_eur, 0.94);
        assert_eq!(config.timers.card_delay_ms, 10);
        assert_eq!(config.timers.saved_card_delay_ms, 3_000);
        assert_eq!(config.access.otp_code, "142536");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = WalletConfig::from_toml_str("exchange_rates = 3").unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = WalletConfig::load(&temp_dir.path().join("wallet.toml")).unwrap();
        assert_eq!(config, WalletConfig::default());
    }
}
