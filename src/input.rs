//! Input normalizer: cleans untrusted aggregator input before it reaches
//! the session store or the menu engine.
//!
//! USSD callbacks arrive on an unauthenticated HTTP surface, so every field
//! is checked here and the handler refuses to go further on any rejection.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::InputError;

/// Country calling code for this deployment (Uganda).
pub const COUNTRY_CODE: &str = "256";

/// Maximum accepted length of the accumulated `text` field.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Maximum accepted length of an aggregator session id.
pub const MAX_SESSION_ID_LENGTH: usize = 100;

/// Separator the aggregator uses between keystroke submissions.
pub const INPUT_SEPARATOR: char = '*';

static WITH_PLUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+256\d{9}$").expect("valid regex"));
static WITH_COUNTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^256\d{9}$").expect("valid regex"));
static WITH_TRUNK_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0\d{9}$").expect("valid regex"));
static SUBSCRIBER_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^7\d{8}$").expect("valid regex"));
static CANONICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^2567\d{8}$").expect("valid regex"));
static SESSION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.:\-]+$").expect("valid regex"));

/// A phone number in canonical form: country code + 9 subscriber digits,
/// no `+`, no trunk zero (e.g. `256701234567`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPhone(String);

impl CanonicalPhone {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering: everything but the last four digits masked.
    pub fn masked(&self) -> String {
        let visible = self.0.len().saturating_sub(4);
        format!("{}{}", "*".repeat(visible), &self.0[visible..])
    }
}

impl std::fmt::Display for CanonicalPhone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw phone number into canonical form.
///
/// Accepted shapes, after stripping everything but digits and `+`:
/// `+256XXXXXXXXX`, `256XXXXXXXXX`, `0XXXXXXXXX`, `7XXXXXXXX`.
pub fn normalize_phone(raw: &str) -> Result<CanonicalPhone, InputError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let candidate = if WITH_PLUS.is_match(&cleaned) {
        cleaned[1..].to_string()
    } else if WITH_COUNTRY.is_match(&cleaned) {
        cleaned
    } else if WITH_TRUNK_ZERO.is_match(&cleaned) {
        format!("{COUNTRY_CODE}{}", &cleaned[1..])
    } else if SUBSCRIBER_ONLY.is_match(&cleaned) {
        format!("{COUNTRY_CODE}{cleaned}")
    } else {
        return Err(InputError::InvalidPhone);
    };

    if CANONICAL.is_match(&candidate) {
        Ok(CanonicalPhone(candidate))
    } else {
        Err(InputError::InvalidPhone)
    }
}

/// Whether an aggregator session id is acceptable.
pub fn validate_session_id(raw: &str) -> bool {
    !raw.is_empty() && raw.len() <= MAX_SESSION_ID_LENGTH && SESSION_ID.is_match(raw)
}

/// Whether the accumulated `text` field is acceptable. Content is not checked.
pub fn validate_text(raw: &str) -> bool {
    raw.chars().count() <= MAX_TEXT_LENGTH
}

/// Check all three callback fields at once.
pub fn validate_callback(
    session_id: &str,
    phone: &str,
    text: &str,
) -> Result<CanonicalPhone, InputError> {
    if !validate_session_id(session_id) {
        return Err(InputError::InvalidSessionId);
    }
    if !validate_text(text) {
        return Err(InputError::TextTooLong {
            length: text.chars().count(),
            max: MAX_TEXT_LENGTH,
        });
    }
    normalize_phone(phone)
}

/// Extract the latest keystroke submission from the accumulated history.
///
/// `"1*John Doe*2"` yields `"2"`. Returns `None` on the opening turn, when the
/// history is empty; an empty trailing segment (`"1*"`) yields `Some("")`.
pub fn latest_input(text: &str) -> Option<&str> {
    if text.is_empty() {
        return None;
    }
    text.rsplit(INPUT_SEPARATOR).next().map(str::trim)
}
