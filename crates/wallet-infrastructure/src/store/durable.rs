//! Checksummed, encoded record store.
//!
//! Every record is stored as `{data, metadata: {timestamp, version, deviceId,
//! checksum, ...extra}}`, serialized to JSON and then encoded. Failures never
//! cross this boundary: `save` answers `false` and `load` answers `None`.

use super::checksum::checksum;
use super::codec::{self, CodecError};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use wallet_core::config::StorageConfig;
use wallet_core::error::WalletError;
use wallet_core::storage::{KeyValueMedium, MediumError};

const PROBE_KEY: &str = "__storage_test__";
const PROBE_VALUE: &str = "test";

#[derive(Error, Debug)]
enum StoreError {
    #[error("store disabled")]
    Disabled,
    #[error(transparent)]
    Medium(#[from] MediumError),
    #[error("decode failed: {0}")]
    Decode(#[from] CodecError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },
    #[error("read-back differs from written data")]
    ReadBackMismatch,
    #[error("record vanished after write")]
    ReadBackMissing,
}

impl StoreError {
    /// Why `key` is being treated as absent, in the shared error taxonomy.
    fn into_wallet_error(self, key: &str) -> WalletError {
        match self {
            Self::Disabled => WalletError::StoreUnavailable,
            Self::Medium(e) => WalletError::io(format!("'{}': {}", key, e)),
            other => WalletError::corrupt(key, other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Unix millis at write time.
    pub timestamp: i64,
    pub version: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub checksum: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredRecord {
    data: Value,
    metadata: RecordMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord<T> {
    pub data: T,
    pub metadata: RecordMetadata,
}

pub struct DurableStore {
    medium: Arc<dyn KeyValueMedium>,
    available: bool,
    version: String,
    encoding_enabled: bool,
    device_id: String,
}

impl DurableStore {
    /// Probes the medium once; a failed probe disables the store for good.
    pub fn new(medium: Arc<dyn KeyValueMedium>, config: &StorageConfig) -> Self {
        let available = Self::probe(medium.as_ref());
        if available {
            tracing::debug!("[DurableStore] Medium available (version {})", config.data_version);
        } else {
            tracing::warn!("[DurableStore] Medium unavailable, running without persistence");
        }
        Self {
            medium,
            available,
            version: config.data_version.clone(),
            encoding_enabled: config.encoding_enabled,
            device_id: String::new(),
        }
    }

    /// Sets the device id stamped into every record's metadata.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn probe(medium: &dyn KeyValueMedium) -> bool {
        let result = (|| -> Result<bool, MediumError> {
            medium.set(PROBE_KEY, PROBE_VALUE)?;
            let read = medium.get(PROBE_KEY)?;
            medium.remove(PROBE_KEY)?;
            Ok(read.as_deref() == Some(PROBE_VALUE))
        })();
        match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!("[DurableStore] Availability probe failed: {}", e);
                false
            }
        }
    }

    // ============================================================================
    // Checksummed records
    // ============================================================================

    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> bool {
        self.save_with(key, data, Map::new())
    }

    /// Writes `data`, then reads it back and compares. A mismatch reports
    /// failure even though the write already happened.
    pub fn save_with<T: Serialize>(&self, key: &str, data: &T, extra: Map<String, Value>) -> bool {
        match self.try_save(key, data, extra) {
            Ok(()) => {
                tracing::debug!("[DurableStore] Saved '{}'", key);
                true
            }
            Err(StoreError::Disabled) => false,
            Err(e) => {
                tracing::error!("[DurableStore] Failed to save '{}': {}", key, e);
                false
            }
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<LoadedRecord<T>> {
        match self.load_checked(key) {
            Ok(record) => record,
            Err(WalletError::StoreUnavailable) => None,
            Err(e) if e.is_treated_as_absent() => {
                tracing::warn!("[DurableStore] Discarding: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("[DurableStore] Failed to load: {}", e);
                None
            }
        }
    }

    /// Like [`load`](Self::load), but says why a record is unusable.
    pub fn load_checked<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<LoadedRecord<T>>, WalletError> {
        let Some(record) = self.try_load(key).map_err(|e| e.into_wallet_error(key))? else {
            return Ok(None);
        };
        let data = serde_json::from_value::<T>(record.data)
            .map_err(|e| WalletError::corrupt(key, format!("unexpected shape: {}", e)))?;
        Ok(Some(LoadedRecord {
            data,
            metadata: record.metadata,
        }))
    }

    /// Removes every key in `keys` whose record cannot be decoded or fails
    /// its checksum. Returns how many were removed.
    pub fn purge_corrupted(&self, keys: &[&str]) -> usize {
        if !self.available {
            return 0;
        }
        let mut purged = 0;
        for key in keys {
            match self.try_load(key) {
                Ok(_) => {}
                Err(StoreError::Medium(e)) => {
                    tracing::warn!("[DurableStore] Cannot inspect '{}': {}", key, e);
                }
                Err(e) => {
                    tracing::warn!("[DurableStore] Purging corrupted '{}': {}", key, e);
                    if self.remove(key) {
                        purged += 1;
                    }
                }
            }
        }
        purged
    }

    fn try_save<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        extra: Map<String, Value>,
    ) -> Result<(), StoreError> {
        if !self.available {
            return Err(StoreError::Disabled);
        }

        let data = serde_json::to_value(data)?;
        let record = StoredRecord {
            metadata: RecordMetadata {
                timestamp: Utc::now().timestamp_millis(),
                version: self.version.clone(),
                device_id: self.device_id.clone(),
                checksum: checksum(&data),
                extra,
            },
            data,
        };

        let json = serde_json::to_string(&record)?;
        let stored = if self.encoding_enabled {
            codec::encode(&json)
        } else {
            json
        };
        self.medium.set(key, &stored)?;

        match self.try_load(key)? {
            Some(read_back) if read_back.data == record.data => Ok(()),
            Some(_) => Err(StoreError::ReadBackMismatch),
            None => Err(StoreError::ReadBackMissing),
        }
    }

    fn try_load(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        if !self.available {
            return Err(StoreError::Disabled);
        }
        let Some(raw) = self.medium.get(key)? else {
            return Ok(None);
        };

        let record = Self::decode_record(&raw)?;
        let computed = checksum(&record.data);
        if computed != record.metadata.checksum {
            return Err(StoreError::ChecksumMismatch {
                stored: record.metadata.checksum,
                computed,
            });
        }
        Ok(Some(record))
    }

    /// Encoded text first; raw JSON for records written with encoding off.
    fn decode_record(raw: &str) -> Result<StoredRecord, StoreError> {
        match codec::decode(raw) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(codec_err) => serde_json::from_str(raw).map_err(|_| StoreError::Decode(codec_err)),
        }
    }

    // ============================================================================
    // Plain values (flags, timestamps, externally written keys)
    // ============================================================================

    pub fn read_raw(&self, key: &str) -> Option<String> {
        if !self.available {
            return None;
        }
        match self.medium.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[DurableStore] Failed to read '{}': {}", key, e);
                None
            }
        }
    }

    pub fn write_raw(&self, key: &str, value: &str) -> bool {
        if !self.available {
            return false;
        }
        match self.medium.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[DurableStore] Failed to write '{}': {}", key, e);
                false
            }
        }
    }

    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("[DurableStore] '{}' is not valid JSON: {}", key, e);
                None
            }
        }
    }

    pub fn write_json<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.write_raw(key, &json),
            Err(e) => {
                tracing::error!("[DurableStore] Cannot serialize '{}': {}", key, e);
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        if !self.available {
            return false;
        }
        match self.medium.remove(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[DurableStore] Failed to remove '{}': {}", key, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::{MemoryMedium, UnavailableMedium};
    use proptest::prelude::*;
    use serde_json::json;

    fn store(medium: &MemoryMedium) -> DurableStore {
        DurableStore::new(Arc::new(medium.clone()), &StorageConfig::default()).with_device_id("device_a")
    }

    #[test]
    fn test_save_load_with_metadata() {
        let medium = MemoryMedium::new();
        let store = store(&medium);
        let mut extra = Map::new();
        extra.insert("kind".to_string(), json!("balance"));

        assert!(store.save_with("k", &json!({"bs": 100.5}), extra));
        let loaded: LoadedRecord<Value> = store.load("k").unwrap();
        assert_eq!(loaded.data, json!({"bs": 100.5}));
        assert_eq!(loaded.metadata.device_id, "device_a");
        assert_eq!(loaded.metadata.version, "4.0");
        assert_eq!(loaded.metadata.extra.get("kind"), Some(&json!("balance")));
        assert!(medium.get(PROBE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_stored_text_is_encoded() {
        let medium = MemoryMedium::new();
        let store = store(&medium);
        store.save("k", &json!([1, 2, 3]));
        let raw = medium.get("k").unwrap().unwrap();
        assert!(!raw.starts_with('{'));
        assert!(codec::decode(&raw).unwrap().contains("\"checksum\""));
    }

    #[test]
    fn test_checksum_tamper_is_discarded() {
        let medium = MemoryMedium::new();
        let store = store(&medium);
        store.save("k", &json!({"bs": 10}));

        let raw = codec::decode(&medium.get("k").unwrap().unwrap()).unwrap();
        let mut record: StoredRecord = serde_json::from_str(&raw).unwrap();
        record.metadata.checksum = "12345".to_string();
        medium
            .set("k", &codec::encode(&serde_json::to_string(&record).unwrap()))
            .unwrap();

        assert!(store.load::<Value>("k").is_none());
        match store.load_checked::<Value>("k") {
            Err(WalletError::CorruptRecord { key, reason }) => {
                assert_eq!(key, "k");
                assert!(reason.contains("checksum mismatch"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_raw_json_records_still_load() {
        let medium = MemoryMedium::new();
        let config = StorageConfig {
            encoding_enabled: false,
            ..StorageConfig::default()
        };
        let plain = DurableStore::new(Arc::new(medium.clone()), &config);
        assert!(plain.save("k", &json!("hola")));
        assert!(medium.get("k").unwrap().unwrap().starts_with('{'));

        let encoded = store(&medium);
        assert_eq!(encoded.load::<String>("k").unwrap().data, "hola");
    }

    #[test]
    fn test_garbage_is_absent_and_purged() {
        let medium = MemoryMedium::new();
        let store = store(&medium);
        medium.set("bad", "%%% not a record").unwrap();
        store.save("good", &json!(1));

        assert!(store.load::<Value>("bad").is_none());
        assert_eq!(store.purge_corrupted(&["bad", "good", "missing"]), 1);
        assert!(medium.get("bad").unwrap().is_none());
        assert!(store.load::<Value>("good").is_some());
    }

    #[test]
    fn test_unavailable_medium_disables_store() {
        let store = DurableStore::new(Arc::new(UnavailableMedium), &StorageConfig::default());
        assert!(!store.is_available());
        assert!(!store.save("k", &json!(1)));
        assert!(store.load::<Value>("k").is_none());
        assert!(store.read_raw("k").is_none());
        assert!(!store.write_raw("k", "v"));
        assert_eq!(store.purge_corrupted(&["k"]), 0);
        assert_eq!(
            store.load_checked::<Value>("k").err(),
            Some(WalletError::StoreUnavailable)
        );
    }

    #[test]
    fn test_wrong_shape_is_absent() {
        let medium = MemoryMedium::new();
        let store = store(&medium);
        store.save("k", &json!({"unexpected": true}));
        assert!(store.load::<Vec<u32>>("k").is_none());
        let err = store.load_checked::<Vec<u32>>("k").err().unwrap();
        assert!(err.is_treated_as_absent());
    }

    proptest! {
        #[test]
        fn prop_save_then_load_round_trips(
            name in "\\PC{0,24}",
            amount in -1.0e9f64..1.0e9,
            count in any::<u32>(),
        ) {
            let medium = MemoryMedium::new();
            let store = store(&medium);
            let data = json!({"name": name, "amount": amount, "count": count});
            prop_assert!(store.save("k", &data));
            let loaded: LoadedRecord<Value> = store.load("k").unwrap();
            prop_assert_eq!(loaded.data, data);
        }
    }
}
