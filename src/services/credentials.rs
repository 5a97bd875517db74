use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::services::AccountError;

/// Claims carried by issued access/refresh credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// "access" or "refresh"
    pub token_use: String,
}

/// Short-lived access credential plus longer-lived refresh credential.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies HS256 credential pairs.
#[derive(Clone)]
pub struct CredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl CredentialIssuer {
    #[must_use]
    pub fn new(secret: &str, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 60; // clock skew

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    pub fn issue_pair(&self, user_id: i32) -> Result<TokenPair, AccountError> {
        Ok(TokenPair {
            access: self.issue(user_id, "access", self.access_ttl)?,
            refresh: self.issue(user_id, "refresh", self.refresh_ttl)?,
        })
    }

    /// Verify an access credential and return the user id it names.
    pub fn verify_access(&self, token: &str) -> Result<i32, AccountError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AccountError::Unauthorized(format!("Invalid credential: {e}")))?;

        if data.claims.token_use != "access" {
            return Err(AccountError::Unauthorized(
                "Refresh credential used where an access credential was expected".to_string(),
            ));
        }

        data.claims
            .sub
            .parse::<i32>()
            .map_err(|_| AccountError::Unauthorized("Malformed credential subject".to_string()))
    }

    fn issue(&self, user_id: i32, token_use: &str, ttl: Duration) -> Result<String, AccountError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_use: token_use.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AccountError::Database(anyhow::anyhow!("Failed to sign credential: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new("test-secret", 15, 7)
    }

    #[test]
    fn access_credential_round_trips() {
        let pair = issuer().issue_pair(42).unwrap();
        assert_eq!(issuer().verify_access(&pair.access).unwrap(), 42);
    }

    #[test]
    fn refresh_credential_is_rejected_for_access() {
        let pair = issuer().issue_pair(42).unwrap();
        assert!(issuer().verify_access(&pair.refresh).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(issuer().verify_access("not-a-token").is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let pair = issuer().issue_pair(7).unwrap();
        let other = CredentialIssuer::new("different-secret", 15, 7);
        assert!(other.verify_access(&pair.access).is_err());
    }
}
