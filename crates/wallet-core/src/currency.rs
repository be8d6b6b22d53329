//! Bolívar-canonical balance and derived USD/EUR equivalents.

use serde::{Deserialize, Serialize};

/// Fixed exchange rates used to derive the foreign-currency views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRates {
    pub usd_to_bs: f64,
    pub usd_to_eur: f64,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self {
            usd_to_bs: 138.24,
            usd_to_eur: 0.94,
        }
    }
}

impl ExchangeRates {
    pub fn usd_to_bs(&self, usd: f64) -> f64 {
        usd * self.usd_to_bs
    }

    pub fn usd_to_eur(&self, usd: f64) -> f64 {
        usd * self.usd_to_eur
    }
}

/// A balance whose only authoritative field is `bs`.
///
/// `usd` and `eur` can only be produced by [`recompute`]; there are no setters
/// for them. Deserialized values are re-derived by [`Balance::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Balance {
    bs: f64,
    #[serde(default)]
    usd: f64,
    #[serde(default)]
    eur: f64,
}

impl Balance {
    pub fn from_bs(bs: f64, rates: &ExchangeRates) -> Self {
        recompute(
            Self {
                bs,
                usd: 0.0,
                eur: 0.0,
            },
            rates,
        )
    }

    pub fn bs(&self) -> f64 {
        self.bs
    }

    pub fn usd(&self) -> f64 {
        self.usd
    }

    pub fn eur(&self) -> f64 {
        self.eur
    }

    pub fn set_bs(&mut self, bs: f64, rates: &ExchangeRates) {
        *self = Self::from_bs(bs, rates);
    }

    pub fn credit_bs(&mut self, amount: f64, rates: &ExchangeRates) {
        self.set_bs(self.bs + amount, rates);
    }

    pub fn debit_bs(&mut self, amount: f64, rates: &ExchangeRates) {
        self.set_bs(self.bs - amount, rates);
    }

    /// Discards any persisted derived values and recomputes them from `bs`.
    pub fn normalized(self, rates: &ExchangeRates) -> Self {
        recompute(self, rates)
    }
}

/// Derives `usd`/`eur` from `bs`. Non-positive balances map to zero, never NaN.
pub fn recompute(balance: Balance, rates: &ExchangeRates) -> Balance {
    if balance.bs > 0.0 {
        let usd = balance.bs / rates.usd_to_bs;
        Balance {
            bs: balance.bs,
            usd,
            eur: usd * rates.usd_to_eur,
        }
    } else {
        Balance {
            bs: balance.bs,
            usd: 0.0,
            eur: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_balance_has_zero_equivalents() {
        let balance = Balance::from_bs(0.0, &ExchangeRates::default());
        assert_eq!(balance.usd(), 0.0);
        assert_eq!(balance.eur(), 0.0);
        assert!(!balance.usd().is_nan());
    }

    #[test]
    fn test_credit_recomputes() {
        let rates = ExchangeRates::default();
        let mut balance = Balance::default();
        balance.credit_bs(rates.usd_to_bs(30.0), &rates);
        assert!((balance.usd() - 30.0).abs() < 1e-9);
        assert!((balance.eur() - 28.2).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_ignores_persisted_derived_values() {
        let rates = ExchangeRates::default();
        let tampered: Balance =
            serde_json::from_str(r#"{"bs":138.24,"usd":999.0,"eur":999.0}"#).unwrap();
        let fixed = tampered.normalized(&rates);
        assert!((fixed.usd() - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_recompute_matches_rates(bs in 0.0f64..1.0e9) {
            let rates = ExchangeRates::default();
            let balance = Balance::from_bs(bs, &rates);
            if bs > 0.0 {
                prop_assert_eq!(balance.usd(), bs / rates.usd_to_bs);
                prop_assert_eq!(balance.eur(), (bs / rates.usd_to_bs) * rates.usd_to_eur);
            } else {
                prop_assert_eq!(balance.usd(), 0.0);
                prop_assert_eq!(balance.eur(), 0.0);
            }
        }
    }
}
