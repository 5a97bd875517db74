use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Append-only account lifecycle event. `performed_by` is null for
/// self-service events.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "account_histories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: Option<i32>,

    pub event_type: String,

    pub performed_by: Option<i32>,

    pub description: String,

    pub ip_address: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
