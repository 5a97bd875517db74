use sea_orm::entity::prelude::*;

/// 1:1 with `users`; created in the same transaction as its user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,

    pub profile_picture: Option<String>,

    pub bio: String,

    /// Secondary capability gate: only admins with this flag may demote
    /// other admins.
    pub can_revoke_admins: bool,

    /// Free-text identity hint collected at registration.
    pub memorable_information: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
