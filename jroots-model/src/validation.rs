use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ModelError;

// 5-32 chars, alphanumeric at both ends, underscores allowed inside.
// A single alphanumeric character also matches.
static TELEGRAM_USERNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9_]{3,30}[a-zA-Z0-9])?$")
        .expect("telegram username pattern is valid")
});

fn strip_at(username: &str) -> &str {
    username.strip_prefix('@').unwrap_or(username)
}

/// Checks a Telegram handle, with or without its leading `@`.
pub fn is_valid_telegram_username(username: &str) -> bool {
    TELEGRAM_USERNAME.is_match(strip_at(username))
}

/// Returns the handle without `@`, or an error when it is malformed.
pub fn normalize_telegram_username(username: &str) -> Result<String, ModelError> {
    if is_valid_telegram_username(username) {
        Ok(strip_at(username).to_string())
    } else {
        Err(ModelError::InvalidTelegramUsername(username.to_string()))
    }
}
