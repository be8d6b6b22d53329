use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Processing,
    Verified,
    BankValidation,
    BankValidated,
}

impl VerificationStatus {
    /// Statuses from which a completed verification submission starts the
    /// document-processing window.
    pub fn awaits_documents(&self) -> bool {
        matches!(self, Self::Unverified | Self::Pending)
    }
}

/// Verification status plus the identity details captured along the way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    #[serde(default)]
    pub status: VerificationStatus,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    pub fn transition(&mut self, status: VerificationStatus, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.updated_at = Some(now);
        true
    }
}
