//! Identifier sanitizing and name normalization.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::time::is_valid_date_code;

static TOKEN_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("static regex"));
static HEADER_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));
static EIGHT_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}").expect("static regex"));

/// A sanitized identifier used in acquisition ids and file names.
///
/// Only `[A-Za-z0-9_-]` survives; the value is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Sanitize `raw`, failing with a message naming `label` when nothing is left.
    pub fn parse(raw: &str, label: &'static str) -> Result<Self, ConfigError> {
        let cleaned = TOKEN_STRIP.replace_all(raw.trim(), "");
        if cleaned.is_empty() {
            return Err(ConfigError::EmptyToken { label });
        }
        Ok(Self(cleaned.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Token {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Token::parse(&value, "identifier")
    }
}

impl From<Token> for String {
    fn from(value: Token) -> Self {
        value.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lower-case a CSV header and drop everything that is not `[a-z0-9]`.
pub fn normalize_header_name(value: &str) -> String {
    HEADER_STRIP
        .replace_all(&value.trim().to_lowercase(), "")
        .into_owned()
}

/// Lookup key for an image name: basename, extension stripped, lower-cased.
///
/// Both `/` and `\` count as separators so pose files written on Windows
/// still match.
pub fn normalize_image_key(value: &str) -> String {
    let trimmed = value.trim();
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    let stem = match base.rfind('.') {
        Some(0) | None => base,
        Some(idx) => &base[..idx],
    };
    stem.to_lowercase()
}

/// First valid `YYYYMMDD` run embedded in a folder name.
pub fn date_from_folder_name(folder_name: &str) -> Option<String> {
    EIGHT_DIGITS
        .find_iter(folder_name)
        .map(|m| m.as_str())
        .find(|candidate| is_valid_date_code(candidate))
        .map(str::to_owned)
}
