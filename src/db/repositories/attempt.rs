use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::fmt_utc;
use crate::entities::password_reset_attempts;

/// Attempts for one email inside the trailing window, oldest first.
#[derive(Debug, Clone)]
pub struct AttemptWindow {
    pub count: u64,
    /// Creation time of the oldest attempt still inside the window.
    pub oldest: Option<chrono::DateTime<chrono::Utc>>,
}

pub struct AttemptRepository {
    conn: DatabaseConnection,
}

impl AttemptRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn record(&self, email: &str) -> Result<()> {
        password_reset_attempts::ActiveModel {
            email: Set(email.to_string()),
            created_at: Set(fmt_utc(chrono::Utc::now())),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to record password reset attempt")?;

        Ok(())
    }

    /// Count attempts for `email` since `window_start` and find the oldest.
    pub async fn window(
        &self,
        email: &str,
        window_start: chrono::DateTime<chrono::Utc>,
    ) -> Result<AttemptWindow> {
        let rows = password_reset_attempts::Entity::find()
            .filter(password_reset_attempts::Column::Email.eq(email))
            .filter(password_reset_attempts::Column::CreatedAt.gte(fmt_utc(window_start)))
            .order_by_asc(password_reset_attempts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query password reset attempts")?;

        let oldest = rows
            .first()
            .and_then(|row| chrono::DateTime::parse_from_rfc3339(&row.created_at).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc));

        Ok(AttemptWindow {
            count: rows.len() as u64,
            oldest,
        })
    }

    /// Delete attempts older than `cutoff`. Best-effort compaction; the
    /// windowed query above never sees them either way.
    pub async fn purge_older_than(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<u64> {
        let result = password_reset_attempts::Entity::delete_many()
            .filter(password_reset_attempts::Column::CreatedAt.lt(fmt_utc(cutoff)))
            .exec(&self.conn)
            .await
            .context("Failed to purge password reset attempts")?;

        Ok(result.rows_affected)
    }
}
