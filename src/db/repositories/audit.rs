use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::db::now_utc;
use crate::entities::{account_histories, admin_activity_logs, prelude::*};

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add_activity(
        &self,
        user_id: Option<i32>,
        action: &str,
        target_user_id: Option<i32>,
        description: &str,
        ip_address: &str,
    ) -> Result<()> {
        let active_model = admin_activity_logs::ActiveModel {
            user_id: Set(user_id),
            action: Set(action.to_string()),
            target_user_id: Set(target_user_id),
            description: Set(description.to_string()),
            ip_address: Set(ip_address.to_string()),
            created_at: Set(now_utc()),
            ..Default::default()
        };

        AdminActivityLogs::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert admin activity log")?;
        Ok(())
    }

    pub async fn add_history(
        &self,
        user_id: Option<i32>,
        event_type: &str,
        performed_by: Option<i32>,
        description: &str,
        ip_address: &str,
    ) -> Result<()> {
        let active_model = account_histories::ActiveModel {
            user_id: Set(user_id),
            event_type: Set(event_type.to_string()),
            performed_by: Set(performed_by),
            description: Set(description.to_string()),
            ip_address: Set(ip_address.to_string()),
            created_at: Set(now_utc()),
            ..Default::default()
        };

        AccountHistories::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert account history")?;
        Ok(())
    }

    /// Admin activity, newest first, optionally filtered by action kind.
    pub async fn list_activity(
        &self,
        action_filter: Option<String>,
        limit: u64,
    ) -> Result<Vec<admin_activity_logs::Model>> {
        let mut query = AdminActivityLogs::find()
            .order_by_desc(admin_activity_logs::Column::CreatedAt)
            .order_by_desc(admin_activity_logs::Column::Id);

        if let Some(action) = action_filter {
            query = query.filter(admin_activity_logs::Column::Action.eq(action));
        }

        query
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query admin activity logs")
    }

    /// Account lifecycle events, newest first, optionally filtered by kind.
    pub async fn list_history(
        &self,
        event_filter: Option<String>,
        limit: u64,
    ) -> Result<Vec<account_histories::Model>> {
        let mut query = AccountHistories::find()
            .order_by_desc(account_histories::Column::CreatedAt)
            .order_by_desc(account_histories::Column::Id);

        if let Some(event_type) = event_filter {
            query = query.filter(account_histories::Column::EventType.eq(event_type));
        }

        query
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query account histories")
    }
}
