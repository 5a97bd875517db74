use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Append-only record of an admin action. User references nullify on
/// delete so the trail survives account removal.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "admin_activity_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: Option<i32>,

    pub action: String,

    pub target_user_id: Option<i32>,

    pub description: String,

    pub ip_address: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
