use crate::error::WalletError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    MobilePayment,
}

impl PaymentMethod {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Card => "CARD_",
            Self::BankTransfer => "BT_",
            Self::MobilePayment => "MP_",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionStatus {
    Processing,
    Pending,
    PendingReview,
    Completed,
    Rejected,
}

impl TransactionStatus {
    /// Settled statuses; a transaction in one of these never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Membership of the pending set.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::PendingReview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub balance_before: f64,
    pub balance_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    /// USD amount, the unit amounts are entered in.
    pub amount: f64,
    pub amount_bs: f64,
    pub amount_eur: f64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub card_label: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub balance_snapshot: Option<BalanceSnapshot>,
}

impl Transaction {
    /// Time-based unique id: `<prefix><unix millis>_<8 hex chars>`.
    pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}{}_{}", prefix, now.timestamp_millis(), &suffix[..8])
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = TransactionStatus::Completed;
        self.approved_at = Some(now);
    }

    pub fn reject(&mut self, now: DateTime<Utc>, reason: impl Into<String>) {
        self.status = TransactionStatus::Rejected;
        self.rejected_at = Some(now);
        self.rejection_reason = Some(reason.into());
    }

    /// The terminal failure of a rejected transaction, `None` otherwise.
    pub fn rejection_error(&self) -> Option<WalletError> {
        (self.status == TransactionStatus::Rejected).then(|| WalletError::SimulatedRejection {
            reason: self.rejection_reason.clone().unwrap_or_default(),
        })
    }
}

/// Withdrawal request written to the session store by the withdrawal page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// USD amount. The withdrawal page writes it as text.
    #[serde(with = "amount_text")]
    pub amount: f64,
    #[serde(rename = "bancoDestino")]
    pub destination_bank: String,
}

mod amount_text {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.trim().parse().map_err(D::Error::custom),
        }
    }
}
