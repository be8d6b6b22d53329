//! Reversible text encoding applied to stored payloads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("not valid base64: {0}")]
    Base64(String),
    #[error("decoded bytes are not UTF-8")]
    Utf8,
}

pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn decode(encoded: &str) -> Result<String, CodecError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CodecError::Base64(e.to_string()))?;
    String::from_utf8(bytes).map_err(|_| CodecError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_plain_json() {
        assert!(decode(r#"{"data":1}"#).is_err());
    }

    #[test]
    fn test_non_ascii_survives() {
        let text = r#"{"name":"José Ñúñez"}"#;
        assert_eq!(decode(&encode(text)).unwrap(), text);
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        assert_eq!(decode(&STANDARD.encode([0xff, 0xfe])), Err(CodecError::Utf8));
    }
}
