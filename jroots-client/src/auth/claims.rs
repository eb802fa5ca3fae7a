use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Claims the archive API embeds in its access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account email for user tokens, admin name for admin tokens.
    pub sub: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Who is logged in, as far as the token says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub email: String,
    pub username: Option<String>,
    pub is_verified: bool,
}

impl From<TokenClaims> for SessionUser {
    fn from(claims: TokenClaims) -> Self {
        Self {
            email: claims.sub,
            username: claims.username,
            is_verified: claims.is_verified.unwrap_or(false),
        }
    }
}

/// Decodes the JWT payload without verifying the signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::InvalidFormat);
    }
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|_| TokenError::InvalidFormat)?;
    serde_json::from_slice(&payload).map_err(|e| TokenError::InvalidPayload(e.to_string()))
}

/// Whether `token` should be discarded at `now`.
///
/// Undecodable tokens count as expired. A token without `exp` does not expire
/// on the client side.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    match decode_claims(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => {
            let expired = exp < now.timestamp();
            if expired {
                debug!(
                    "Token expired {} seconds ago",
                    now.timestamp().saturating_sub(exp)
                );
            }
            expired
        }
        Ok(_) => false,
        Err(e) => {
            warn!("Failed to decode token for expiry check: {}", e);
            true
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::*;
    use super::*;

    #[test]
    fn decodes_user_claims() {
        let token = token_expiring_in(3600);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "reader@example.org");
        assert_eq!(claims.username.as_deref(), Some("reader"));

        let user = SessionUser::from(claims);
        assert!(user.is_verified);
        assert_eq!(user.email, "reader@example.org");
    }

    #[test]
    fn expiry_follows_exp_claim() {
        let now = Utc::now();
        assert!(!is_token_expired(&token_expiring_in(300), now));
        assert!(is_token_expired(&token_expiring_in(-5), now));
    }

    #[test]
    fn token_without_exp_is_not_expired() {
        let token = make_token(&serde_json::json!({ "sub": "admin" }));
        assert!(!is_token_expired(&token, Utc::now()));
        let user = SessionUser::from(decode_claims(&token).unwrap());
        assert!(!user.is_verified);
        assert_eq!(user.username, None);
    }

    #[test]
    fn malformed_tokens_are_expired() {
        assert_eq!(decode_claims("opaque-session"), Err(TokenError::InvalidFormat));
        assert_eq!(decode_claims("a.!!!.c"), Err(TokenError::InvalidFormat));
        assert!(matches!(
            decode_claims(&format!("a.{}.c", URL_SAFE_NO_PAD.encode("[]"))),
            Err(TokenError::InvalidPayload(_))
        ));
        assert!(is_token_expired("opaque-session", Utc::now()));
    }
}
