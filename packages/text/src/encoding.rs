//! Byte/text conversion at the stream boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Byte substituted for characters Latin-1 cannot represent.
const LATIN1_REPLACEMENT: u8 = b'?';

/// How stream bytes map to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Strict UTF-8; invalid sequences are a decode error (default)
    #[default]
    Utf8,
    /// UTF-8 with invalid sequences replaced by U+FFFD
    Utf8Lossy,
    /// ISO-8859-1, one byte per character
    Latin1,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid UTF-8 at byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },
}

impl Encoding {
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 | Encoding::Utf8Lossy => text.as_bytes().to_vec(),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(LATIN1_REPLACEMENT))
                .collect(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| DecodeError::InvalidUtf8 {
                    valid_up_to: e.valid_up_to(),
                }),
            Encoding::Utf8Lossy => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Decode an owned buffer, avoiding a copy when it is already valid UTF-8.
    pub fn decode_owned(&self, bytes: Vec<u8>) -> Result<String, DecodeError> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8 {
                valid_up_to: e.utf8_error().valid_up_to(),
            }),
            Encoding::Utf8Lossy => match String::from_utf8(bytes) {
                Ok(text) => Ok(text),
                Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
            },
            Encoding::Latin1 => self.decode(&bytes),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf8" | "utf-8" | "text" => Ok(Encoding::Utf8),
            "utf8_lossy" | "utf8-lossy" | "lossy" => Ok(Encoding::Utf8Lossy),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(format!("unknown encoding: {}", other)),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf8"),
            Encoding::Utf8Lossy => write!(f, "utf8_lossy"),
            Encoding::Latin1 => write!(f, "latin1"),
        }
    }
}
