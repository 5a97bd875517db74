pub mod accounts;
pub mod audit;
pub mod credentials;
pub mod password_reset;

pub use accounts::AccountService;
pub use audit::{AccountEvent, AdminAction, AuditService};
pub use credentials::{CredentialIssuer, TokenPair};
pub use password_reset::{PasswordResetService, TokenStatus};

use thiserror::Error;

/// Error taxonomy shared by the account and password-reset services.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Too many reset attempts. Please try again later.")]
    RateLimited { seconds_remaining: i64 },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    EmailDelivery(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl AccountError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
