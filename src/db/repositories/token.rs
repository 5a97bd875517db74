use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::task;

use crate::db::{fmt_utc, now_utc};
use crate::entities::{password_reset_tokens, users};

/// A reset token is valid iff it is unused and unexpired.
#[must_use]
pub fn is_valid(token: &password_reset_tokens::Model) -> bool {
    !token.is_used && now_utc().as_str() < token.expires_at.as_str()
}

/// Outcome of a transactional token consumption.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Password updated, token marked used.
    Consumed,
    /// Token exists but is expired or already used.
    Invalid,
    NotFound,
}

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a fresh token for the user with the given validity window.
    pub async fn create(
        &self,
        user_id: i32,
        token: &str,
        ttl: chrono::Duration,
    ) -> Result<password_reset_tokens::Model> {
        let now = chrono::Utc::now();

        password_reset_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(token.to_string()),
            created_at: Set(fmt_utc(now)),
            expires_at: Set(fmt_utc(now + ttl)),
            is_used: Set(false),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert password reset token")
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<password_reset_tokens::Model>> {
        password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query password reset token")
    }

    /// Set the owning user's password and mark the token used, atomically.
    ///
    /// The validity check runs on the row read inside the transaction, so a
    /// token can be consumed at most once even under concurrent confirms.
    pub async fn consume(&self, token: &str, new_password: &str) -> Result<ConsumeOutcome> {
        let password = new_password.to_string();
        let password_hash =
            task::spawn_blocking(move || crate::db::repositories::user::hash_password(&password))
                .await
                .context("Password hashing task panicked")??;

        let txn = self.conn.begin().await?;

        let Some(reset_token) = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(ConsumeOutcome::NotFound);
        };

        if !is_valid(&reset_token) {
            txn.rollback().await?;
            return Ok(ConsumeOutcome::Invalid);
        }

        let Some(user) = users::Entity::find_by_id(reset_token.user_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(ConsumeOutcome::Invalid);
        };

        let mut user_active: users::ActiveModel = user.into();
        user_active.password_hash = Set(password_hash);
        user_active.updated_at = Set(now_utc());
        user_active.update(&txn).await?;

        let mut token_active: password_reset_tokens::ActiveModel = reset_token.into();
        token_active.is_used = Set(true);
        token_active.update(&txn).await?;

        txn.commit().await?;

        Ok(ConsumeOutcome::Consumed)
    }
}
