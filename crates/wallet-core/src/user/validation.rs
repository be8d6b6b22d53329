//! Field validators for registration, verification and card entry.

use once_cell::sync::Lazy;
use regex::Regex;

static NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zÀ-ÖØ-öø-ÿ\s]+$").expect("valid name regex"));
static ID_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[VE]\d{7,8}$").expect("valid id regex"));
static PHONE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0412|0414|0416|0424|0426)\d{7}$").expect("valid phone regex")
});

/// Letters (accented included) and spaces, at least two words of two or more characters.
pub fn validate_name(name: &str) -> bool {
    if !NAME_CHARS.is_match(name) {
        return false;
    }
    let parts: Vec<&str> = name.split_whitespace().collect();
    parts.len() >= 2 && parts.iter().all(|part| part.chars().count() >= 2)
}

pub fn validate_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Venezuelan national id: `V` or `E` followed by 7 or 8 digits.
pub fn validate_id_number(id_number: &str) -> bool {
    ID_NUMBER.is_match(id_number)
}

pub fn validate_phone_number(phone: &str) -> bool {
    PHONE_NUMBER.is_match(phone)
}

/// Strips everything but digits from a card number as typed.
pub fn normalize_card_number(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 13 to 19 digits passing the Luhn check, or the configured test card.
pub fn validate_card_number(raw: &str, configured: &str) -> bool {
    let digits = normalize_card_number(raw);
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    if digits == configured {
        return true;
    }
    luhn(&digits)
}

fn luhn(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
