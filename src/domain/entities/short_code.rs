//! Short code value type, the sole lookup key across every cache tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum accepted short code length.
pub const MIN_CODE_LEN: usize = 6;

/// Maximum accepted short code length.
pub const MAX_CODE_LEN: usize = 10;

/// Rejection reason for a malformed short code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidShortCode {
    #[error("short code must be 6-10 characters, got {0}")]
    Length(usize),
    #[error("short code must be alphanumeric")]
    Charset,
}

/// A validated short code.
///
/// Alphanumeric, between [`MIN_CODE_LEN`] and [`MAX_CODE_LEN`] ASCII characters.
/// Serializes as a plain string; deserialization re-validates, so a corrupted
/// L2 payload or coherence message can never smuggle in an invalid key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Validates and wraps a raw short code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidShortCode`] when the length is out of range or the
    /// input contains anything other than ASCII letters and digits.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidShortCode> {
        let raw = raw.into();
        let len = raw.chars().count();

        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
            return Err(InvalidShortCode::Length(len));
        }

        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidShortCode::Charset);
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortCode {
    type Error = InvalidShortCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
