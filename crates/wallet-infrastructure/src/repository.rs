//! [`WalletRepository`] over a [`DurableStore`].
//!
//! Balance, ledger, pending transfers, card data and the profile carry the
//! owning device id; a record written by another device loads as absent.
//! This is advisory only: the id is a client-side value.

use crate::keys::durable as keys;
use crate::store::DurableStore;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use wallet_core::config::WalletConfig;
use wallet_core::currency::{Balance, ExchangeRates};
use wallet_core::error::WalletError;
use wallet_core::evolution::EvolutionStage;
use wallet_core::repository::{ExternalVerification, Milestone, WalletRepository};
use wallet_core::storage::KeyValueMedium;
use wallet_core::transaction::{Ledger, Transaction};
use wallet_core::user::{BankLinkData, CardData, RegistrationRecord, UserProfile};
use wallet_core::verification::VerificationRecord;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceRecord {
    bs: f64,
    #[serde(default)]
    usd: f64,
    #[serde(default)]
    eur: f64,
    device_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceBackup {
    bs: f64,
    device_id: String,
    timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerRecord {
    transactions: Vec<Transaction>,
    device_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingTransfersRecord {
    transfers: Vec<Transaction>,
    device_id: String,
}

pub struct DurableWalletRepository {
    store: DurableStore,
    device_id: String,
    rates: ExchangeRates,
}

impl DurableWalletRepository {
    /// Opens the repository, resolving (or creating) the device id first.
    pub fn open(medium: Arc<dyn KeyValueMedium>, config: &WalletConfig) -> Self {
        let store = DurableStore::new(medium, &config.storage);
        let device_id = Self::resolve_device_id(&store);
        tracing::info!("[Repository] Device {}", device_id);
        Self {
            store: store.with_device_id(device_id.clone()),
            device_id,
            rates: config.exchange_rates,
        }
    }

    fn resolve_device_id(store: &DurableStore) -> String {
        if let Some(existing) = store.read_raw(keys::DEVICE_ID).filter(|id| !id.is_empty()) {
            return existing;
        }
        let device_id = format!("device_{}", Uuid::new_v4().simple());
        if !store.write_raw(keys::DEVICE_ID, &device_id) {
            tracing::debug!("[Repository] Device id is not persisted for this run");
        }
        device_id
    }

    /// `Err(DeviceMismatch)` for records written by another install.
    pub fn check_owner(&self, key: &str, owner: &str) -> Result<(), WalletError> {
        if owner == self.device_id {
            return Ok(());
        }
        Err(WalletError::DeviceMismatch {
            key: key.to_string(),
        })
    }

    fn owned_by_this_device(&self, key: &str, owner: &str) -> bool {
        match self.check_owner(key, owner) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "[Repository] Ignoring record: {} (written by {}, current {})",
                    e,
                    owner,
                    self.device_id
                );
                false
            }
        }
    }

    fn load_bool(&self, key: &str) -> bool {
        self.store.read_raw(key).as_deref() == Some("true")
    }

    fn load_millis(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.store.read_raw(key)?;
        let millis = raw.trim().parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    fn save_millis(&self, key: &str, at: DateTime<Utc>) -> bool {
        self.store.write_raw(key, &at.timestamp_millis().to_string())
    }

    fn milestone_key(milestone: Milestone) -> &'static str {
        match milestone {
            Milestone::LastInteraction => keys::LAST_INTERACTION,
            Milestone::LastRecharge => keys::LAST_RECHARGE_TIME,
            Milestone::LastVerification => keys::LAST_VERIFICATION_TIME,
            Milestone::LastExternalVerificationCheck => keys::LAST_EXTERNAL_VERIFICATION_CHECK,
        }
    }

    fn load_balance_backup(&self) -> Option<Balance> {
        let backup: BalanceBackup = self.store.read_json(keys::BALANCE_BACKUP)?;
        if !self.owned_by_this_device(keys::BALANCE_BACKUP, &backup.device_id) {
            return None;
        }
        tracing::info!("[Repository] Balance restored from backup");
        Some(Balance::from_bs(backup.bs, &self.rates))
    }
}

/// Reads bank details from an externally written JSON object, accepting both
/// camelCase and kebab-case field names.
fn parse_bank_link(value: &Value) -> Option<BankLinkData> {
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| value.get(*name).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some(BankLinkData {
        name: field(&["bankName", "bank-name"])?,
        account_number: field(&["accountNumber", "account-number"]),
        logo: field(&["bankLogo", "bank-logo"]),
    })
}

impl WalletRepository for DurableWalletRepository {
    fn is_available(&self) -> bool {
        self.store.is_available()
    }

    fn storage_version(&self) -> String {
        self.store.version().to_string()
    }

    fn purge_corrupted(&self) -> usize {
        let purged = self.store.purge_corrupted(&keys::CHECKSUMMED);
        if purged > 0 {
            tracing::warn!("[Repository] Purged {} corrupted record(s)", purged);
        }
        purged
    }

    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn load_profile(&self) -> Option<UserProfile> {
        let record = self.store.load::<UserProfile>(keys::USER_DATA)?;
        let mut profile = record.data;
        if !self.owned_by_this_device(keys::USER_DATA, &profile.device_id) {
            return None;
        }
        profile.balance = profile.balance.normalized(&self.rates);
        Some(profile)
    }

    fn save_profile(&self, profile: &UserProfile) -> bool {
        self.store.save(keys::USER_DATA, profile)
    }

    fn load_balance(&self) -> Option<Balance> {
        let primary = self
            .store
            .load::<BalanceRecord>(keys::BALANCE)
            .map(|r| r.data)
            .filter(|r| self.owned_by_this_device(keys::BALANCE, &r.device_id))
            .map(|r| Balance::from_bs(r.bs, &self.rates));
        primary.or_else(|| self.load_balance_backup())
    }

    fn save_balance(&self, balance: &Balance) -> bool {
        let record = BalanceRecord {
            bs: balance.bs(),
            usd: balance.usd(),
            eur: balance.eur(),
            device_id: self.device_id.clone(),
        };
        if self.store.save(keys::BALANCE, &record) {
            return true;
        }
        let backup = BalanceBackup {
            bs: balance.bs(),
            device_id: self.device_id.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        if self.store.write_json(keys::BALANCE_BACKUP, &backup) {
            tracing::warn!("[Repository] Balance written to backup key only");
        }
        false
    }

    fn load_ledger(&self) -> Ledger {
        self.store
            .load::<LedgerRecord>(keys::TRANSACTIONS)
            .map(|r| r.data)
            .filter(|r| self.owned_by_this_device(keys::TRANSACTIONS, &r.device_id))
            .map(|r| Ledger::from_transactions(r.transactions))
            .unwrap_or_default()
    }

    fn save_ledger(&self, ledger: &Ledger) -> bool {
        let record = LedgerRecord {
            transactions: ledger.transactions().to_vec(),
            device_id: self.device_id.clone(),
        };
        self.store.save(keys::TRANSACTIONS, &record)
    }

    fn load_pending_bank_transfers(&self) -> Vec<Transaction> {
        self.store
            .load::<PendingTransfersRecord>(keys::PENDING_BANK_TRANSFERS)
            .map(|r| r.data)
            .filter(|r| self.owned_by_this_device(keys::PENDING_BANK_TRANSFERS, &r.device_id))
            .map(|r| r.transfers)
            .unwrap_or_default()
    }

    fn save_pending_bank_transfers(&self, transfers: &[Transaction]) -> bool {
        let record = PendingTransfersRecord {
            transfers: transfers.to_vec(),
            device_id: self.device_id.clone(),
        };
        self.store.save(keys::PENDING_BANK_TRANSFERS, &record)
    }

    fn load_card_data(&self) -> Option<CardData> {
        let card = self.store.load::<CardData>(keys::CARD_DATA)?.data;
        self.owned_by_this_device(keys::CARD_DATA, &card.device_id)
            .then_some(card)
    }

    fn save_card_data(&self, card: &CardData) -> bool {
        let card = CardData {
            device_id: self.device_id.clone(),
            ..card.clone()
        };
        self.store.save(keys::CARD_DATA, &card)
    }

    fn load_first_recharge(&self) -> bool {
        self.load_bool(keys::HAS_MADE_FIRST_RECHARGE)
    }

    fn save_first_recharge(&self, done: bool) -> bool {
        self.store
            .write_raw(keys::HAS_MADE_FIRST_RECHARGE, if done { "true" } else { "false" })
    }

    fn load_verification(&self) -> Option<VerificationRecord> {
        self.store
            .load::<VerificationRecord>(keys::VERIFICATION_STATUS)
            .map(|r| r.data)
    }

    fn save_verification(&self, record: &VerificationRecord) -> bool {
        self.store.save(keys::VERIFICATION_STATUS, record)
    }

    fn load_registration(&self) -> Option<RegistrationRecord> {
        self.store
            .load::<RegistrationRecord>(keys::USER_REGISTRATION)
            .map(|r| r.data)
    }

    fn save_registration(&self, record: &RegistrationRecord) -> bool {
        let saved = self.store.save(keys::USER_REGISTRATION, record);
        let flagged = self.store.write_raw(
            keys::IS_REGISTERED,
            if record.is_registered { "true" } else { "false" },
        );
        saved && flagged
    }

    fn is_registered(&self) -> bool {
        self.load_bool(keys::IS_REGISTERED) && self.load_registration().is_some()
    }

    fn load_stage(&self) -> Option<EvolutionStage> {
        let raw = self.store.read_raw(keys::EVOLUTION_STATE)?;
        EvolutionStage::from_str(raw.trim()).ok()
    }

    fn save_stage(&self, stage: EvolutionStage) -> bool {
        self.store.write_raw(keys::EVOLUTION_STATE, &stage.to_string())
    }

    fn load_processing_start(&self) -> Option<DateTime<Utc>> {
        self.load_millis(keys::PROCESSING_START)
    }

    fn save_processing_start(&self, started_at: DateTime<Utc>) -> bool {
        self.save_millis(keys::PROCESSING_START, started_at)
    }

    fn clear_processing_start(&self) -> bool {
        self.store.remove(keys::PROCESSING_START)
    }

    fn load_milestone(&self, milestone: Milestone) -> Option<DateTime<Utc>> {
        self.load_millis(Self::milestone_key(milestone))
    }

    fn save_milestone(&self, milestone: Milestone, at: DateTime<Utc>) -> bool {
        self.save_millis(Self::milestone_key(milestone), at)
    }

    fn load_bank_link(&self) -> Option<BankLinkData> {
        self.store
            .load::<BankLinkData>(keys::BANK_DATA)
            .map(|r| r.data)
            .or_else(|| self.load_external_bank_link())
    }

    fn save_bank_link(&self, data: &BankLinkData) -> bool {
        self.store.save(keys::BANK_DATA, data)
    }

    fn load_external_bank_link(&self) -> Option<BankLinkData> {
        [keys::VERIFICATION_BANKING, keys::BANK_VALIDATION_DATA]
            .iter()
            .filter_map(|key| self.store.read_json::<Value>(key))
            .find_map(|value| parse_bank_link(&value))
    }

    fn load_external_verification(&self) -> Option<ExternalVerification> {
        let value: Value = self.store.read_json(keys::VERIFICATION_BANKING)?;
        let millis = value.get("timestamp").and_then(Value::as_i64)?;
        Some(ExternalVerification {
            submitted_at: Utc.timestamp_millis_opt(millis).single()?,
            bank_link: parse_bank_link(&value),
        })
    }
}
