use anyhow::Result;
use tracing::warn;

use crate::db::Store;
use crate::entities::{account_histories, admin_activity_logs};

pub const DEFAULT_QUERY_LIMIT: u64 = 50;
pub const MAX_QUERY_LIMIT: u64 = 500;

/// Kind of admin action recorded in the activity stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    CreateAdmin,
    RevokeAdmin,
    Login,
    CreateBooking,
    UpdateBooking,
    DeleteBooking,
    Other,
}

impl AdminAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateAdmin => "create-admin",
            Self::RevokeAdmin => "revoke-admin",
            Self::Login => "login",
            Self::CreateBooking => "create-booking",
            Self::UpdateBooking => "update-booking",
            Self::DeleteBooking => "delete-booking",
            Self::Other => "other",
        }
    }
}

/// Kind of account lifecycle event in the history stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEvent {
    Created,
    Revoked,
    Deleted,
    Reactivated,
}

impl AccountEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Revoked => "revoked",
            Self::Deleted => "deleted",
            Self::Reactivated => "reactivated",
        }
    }
}

/// Clamp a caller-supplied result cap.
///
/// Non-numeric input falls back to the default; numeric input outside
/// 1..=500 clamps to the max.
#[must_use]
pub fn clamp_limit(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_QUERY_LIMIT;
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if (1..=MAX_QUERY_LIMIT as i64).contains(&value) => value as u64,
        Ok(_) => MAX_QUERY_LIMIT,
        Err(_) => DEFAULT_QUERY_LIMIT,
    }
}

/// Append-only audit trail over two independent streams.
///
/// Writes are best-effort: the triggering mutation has already committed,
/// so a failed append is logged and swallowed.
#[derive(Clone)]
pub struct AuditService {
    store: Store,
}

impl AuditService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn record_admin_action(
        &self,
        actor: Option<i32>,
        action: AdminAction,
        target: Option<i32>,
        description: &str,
        ip_address: &str,
    ) {
        if let Err(e) = self
            .store
            .audit()
            .add_activity(actor, action.as_str(), target, description, ip_address)
            .await
        {
            warn!("Failed to record admin activity ({}): {e}", action.as_str());
        }
    }

    pub async fn record_account_event(
        &self,
        subject: Option<i32>,
        event: AccountEvent,
        performed_by: Option<i32>,
        description: &str,
        ip_address: &str,
    ) {
        if let Err(e) = self
            .store
            .audit()
            .add_history(subject, event.as_str(), performed_by, description, ip_address)
            .await
        {
            warn!("Failed to record account history ({}): {e}", event.as_str());
        }
    }

    pub async fn list_activity(
        &self,
        action_filter: Option<String>,
        limit: Option<&str>,
    ) -> Result<Vec<admin_activity_logs::Model>> {
        self.store
            .audit()
            .list_activity(action_filter, clamp_limit(limit))
            .await
    }

    pub async fn list_history(
        &self,
        event_filter: Option<String>,
        limit: Option<&str>,
    ) -> Result<Vec<account_histories::Model>> {
        self.store
            .audit()
            .list_history(event_filter, clamp_limit(limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_when_missing_or_garbage() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some("abc")), 50);
        assert_eq!(clamp_limit(Some("")), 50);
        assert_eq!(clamp_limit(Some("12.5")), 50);
    }

    #[test]
    fn limit_clamps_out_of_range_to_max() {
        assert_eq!(clamp_limit(Some("501")), 500);
        assert_eq!(clamp_limit(Some("99999")), 500);
        assert_eq!(clamp_limit(Some("0")), 500);
        assert_eq!(clamp_limit(Some("-3")), 500);
    }

    #[test]
    fn limit_accepts_in_range_values() {
        assert_eq!(clamp_limit(Some("1")), 1);
        assert_eq!(clamp_limit(Some("50")), 50);
        assert_eq!(clamp_limit(Some("500")), 500);
    }
}
