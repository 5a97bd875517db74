use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::db::{ConsumeOutcome, Store};
use crate::db::repositories::token;
use crate::mailer::{Mailer, password_reset_email};
use crate::services::AccountError;

/// Trailing window for reset-request rate limiting.
pub const RATE_LIMIT_WINDOW_MINUTES: i64 = 10;
/// Attempts inside the window that trip the limiter (the third attempt is
/// the boundary: count >= 3 blocks).
pub const RATE_LIMIT_MAX_ATTEMPTS: u64 = 3;
/// Validity window for an issued reset token.
pub const TOKEN_TTL_HOURS: i64 = 1;

/// Result of a token validation probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    /// Exists but expired or already consumed.
    ExpiredOrUsed,
    NotFound,
}

/// Orchestrates the reset-token lifecycle: rate limiter, token store and
/// outbound notification.
#[derive(Clone)]
pub struct PasswordResetService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl PasswordResetService {
    #[must_use]
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, frontend_url: String) -> Self {
        Self {
            store,
            mailer,
            frontend_url,
        }
    }

    /// Issue a reset token for `email` and dispatch the reset link.
    ///
    /// The email must belong to a known user before anything is recorded;
    /// an unknown address leaves no attempt row behind.
    pub async fn request_reset(&self, email: &str) -> Result<(), AccountError> {
        let user = self
            .store
            .users()
            .get_by_email(email)
            .await?
            .ok_or_else(|| {
                AccountError::validation("No user found with this email address.")
            })?;

        let now = Utc::now();
        let window_start = now - Duration::minutes(RATE_LIMIT_WINDOW_MINUTES);
        let window = self.store.attempts().window(email, window_start).await?;

        if window.count >= RATE_LIMIT_MAX_ATTEMPTS {
            let seconds_remaining = window.oldest.map_or(0, |oldest| {
                (oldest + Duration::minutes(RATE_LIMIT_WINDOW_MINUTES) - now)
                    .num_seconds()
                    .max(0)
            });
            return Err(AccountError::RateLimited { seconds_remaining });
        }

        self.store.attempts().record(email).await?;

        // Opportunistic compaction; the windowed query above never sees
        // stale rows, so a failure here is harmless.
        if let Err(e) = self.store.attempts().purge_older_than(window_start).await {
            warn!("Failed to purge stale reset attempts: {e}");
        }

        let token = generate_reset_token();
        self.store
            .tokens()
            .create(user.id, &token, Duration::hours(TOKEN_TTL_HOURS))
            .await?;

        let reset_url = format!("{}/reset-password?token={token}", self.frontend_url);
        self.mailer
            .send(
                &user.email,
                "Reset Your Password",
                &password_reset_email(&reset_url),
            )
            .await
            .map_err(|e| AccountError::EmailDelivery(format!("Failed to send email: {e}")))?;

        info!("Password reset email dispatched for user '{}'", user.username);

        Ok(())
    }

    pub async fn validate_token(&self, raw: &str) -> Result<TokenStatus, AccountError> {
        let Some(reset_token) = self.store.tokens().get_by_token(raw).await? else {
            return Ok(TokenStatus::NotFound);
        };

        if token::is_valid(&reset_token) {
            Ok(TokenStatus::Valid)
        } else {
            Ok(TokenStatus::ExpiredOrUsed)
        }
    }

    /// Consume a valid token and set the owner's password.
    pub async fn confirm_reset(&self, raw: &str, new_password: &str) -> Result<(), AccountError> {
        if new_password.len() < 8 {
            return Err(AccountError::validation(
                "New password must be at least 8 characters.",
            ));
        }

        match self.store.tokens().consume(raw, new_password).await? {
            ConsumeOutcome::Consumed => Ok(()),
            ConsumeOutcome::Invalid => Err(AccountError::validation(
                "Token has expired or already been used.",
            )),
            ConsumeOutcome::NotFound => Err(AccountError::validation("Invalid token.")),
        }
    }
}

/// Generate a URL-safe reset token carrying 32 bytes of entropy.
#[must_use]
pub fn generate_reset_token() -> String {
    use base64::Engine;
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn reset_tokens_are_url_safe_and_long_enough() {
        let token = generate_reset_token();
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn reset_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..64).map(|_| generate_reset_token()).collect();
        assert_eq!(tokens.len(), 64);
    }
}
