//! 32-bit rolling checksum over the compact JSON encoding of a value.
//!
//! `hash = hash * 31 + code_unit` over UTF-16 code units with signed 32-bit
//! wrap-around. Detects partial writes, not tampering.

use serde_json::Value;

pub fn checksum_str(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Checksum of `data`, rendered as the decimal string that is stored.
pub fn checksum(data: &Value) -> String {
    checksum_str(&data.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_values() {
        assert_eq!(checksum_str(""), 0);
        assert_eq!(checksum_str("a"), 97);
        assert_eq!(checksum_str("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_wraps_to_signed() {
        let long = "z".repeat(64);
        // Must not panic on overflow and stays within i32.
        let _ = checksum_str(&long);
        assert_ne!(checksum_str("hello world"), checksum_str("hello worle"));
    }

    #[test]
    fn test_uses_utf16_units() {
        // U+1F600 is one char but two UTF-16 code units.
        let expected = (0xD83Di32).wrapping_mul(31).wrapping_add(0xDE00);
        assert_eq!(checksum_str("😀"), expected);
    }

    #[test]
    fn test_checksum_of_compact_json() {
        let data = json!({"bs": 10.5});
        assert_eq!(checksum(&data), checksum_str(r#"{"bs":10.5}"#).to_string());
    }
}
