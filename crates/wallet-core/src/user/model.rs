use crate::currency::{Balance, ExchangeRates};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity plus balance of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub device_id: String,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub balance: Balance,
    #[serde(default)]
    pub card_recharges_used: u32,
    #[serde(default)]
    pub has_saved_card: bool,
    #[serde(default)]
    pub has_made_first_recharge: bool,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            device_id: device_id.into(),
            id_number: None,
            phone_number: None,
            balance: Balance::default(),
            card_recharges_used: 0,
            has_saved_card: false,
            has_made_first_recharge: false,
        }
    }

    /// First word of the display name, used in personalised copy.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

/// The single credential record created at sign-up.
///
/// The password is kept in plain text. This only makes sense for a
/// simulation and must not be carried over to anything real.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub name: String,
    pub email: String,
    pub password: String,
    pub registered_at: DateTime<Utc>,
    pub is_registered: bool,
}

/// Card-on-file state, persisted under its own key with the owning device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    pub has_saved_card: bool,
    pub recharges_used: u32,
    pub device_id: String,
}

/// Bank account linked by the external bank-validation flow. Read only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankLinkData {
    pub name: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// The amount picked in the recharge screen, with its snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectedAmount {
    pub usd: f64,
    pub bs: f64,
    pub eur: f64,
}

impl SelectedAmount {
    pub fn from_usd(usd: f64, rates: &ExchangeRates) -> Self {
        Self {
            usd,
            bs: rates.usd_to_bs(usd),
            eur: rates.usd_to_eur(usd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let user = UserProfile::new("María José Pérez", "m@example.com", "device_a");
        assert_eq!(user.first_name(), "María");
    }

    #[test]
    fn test_profile_deserializes_with_missing_flags() {
        let json = r#"{"name":"Ana Gil","email":"a@b.c","deviceId":"d1"}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.card_recharges_used, 0);
        assert!(!user.has_made_first_recharge);
        assert_eq!(user.balance.bs(), 0.0);
    }

    #[test]
    fn test_selected_amount_snapshots() {
        let amount = SelectedAmount::from_usd(30.0, &ExchangeRates::default());
        assert!((amount.bs - 4147.2).abs() < 1e-9);
        assert!((amount.eur - 28.2).abs() < 1e-9);
    }
}
