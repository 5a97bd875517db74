use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the bootstrap admin password using Argon2id
fn hash_bootstrap_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"change-me";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash bootstrap password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::FirstName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::LastName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::IsSuperuser)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsStaff)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfiles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(UserProfiles::ProfilePicture).string().null())
                    .col(
                        ColumnDef::new(UserProfiles::Bio)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::CanRevokeAdmins)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::MemorableInformation)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(UserProfiles::CreatedAt).string().not_null())
                    .col(ColumnDef::new(UserProfiles::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profiles_user")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PasswordResetTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordResetTokens::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::CreatedAt)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::ExpiresAt)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetTokens::IsUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_reset_tokens_user")
                            .from(PasswordResetTokens::Table, PasswordResetTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PasswordResetAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordResetAttempts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetAttempts::Email)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetAttempts::CreatedAt)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Windowed rate-limit queries filter by email + created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_reset_attempts_email_created")
                    .table(PasswordResetAttempts::Table)
                    .col(PasswordResetAttempts::Email)
                    .col(PasswordResetAttempts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminActivityLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminActivityLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminActivityLogs::UserId).integer().null())
                    .col(ColumnDef::new(AdminActivityLogs::Action).string().not_null())
                    .col(
                        ColumnDef::new(AdminActivityLogs::TargetUserId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AdminActivityLogs::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AdminActivityLogs::IpAddress)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AdminActivityLogs::CreatedAt)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_activity_logs_user")
                            .from(AdminActivityLogs::Table, AdminActivityLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_activity_logs_target")
                            .from(AdminActivityLogs::Table, AdminActivityLogs::TargetUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_activity_logs_created_at")
                    .table(AdminActivityLogs::Table)
                    .col(AdminActivityLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountHistories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountHistories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountHistories::UserId).integer().null())
                    .col(
                        ColumnDef::new(AccountHistories::EventType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountHistories::PerformedBy).integer().null())
                    .col(
                        ColumnDef::new(AccountHistories::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(AccountHistories::IpAddress)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(AccountHistories::CreatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_histories_user")
                            .from(AccountHistories::Table, AccountHistories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_histories_performer")
                            .from(AccountHistories::Table, AccountHistories::PerformedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_histories_created_at")
                    .table(AccountHistories::Table)
                    .col(AccountHistories::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::UserId).integer().not_null())
                    .col(ColumnDef::new(Bookings::FullName).string().not_null())
                    .col(ColumnDef::new(Bookings::Email).string().not_null())
                    .col(ColumnDef::new(Bookings::Service).string().not_null())
                    .col(ColumnDef::new(Bookings::BookingDate).string().not_null())
                    .col(ColumnDef::new(Bookings::BookingTime).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::Notes)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Bookings::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Bookings::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_user")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed bootstrap superuser; rotate the password after first login.
        let now = crate::db::now_utc();
        let password_hash = hash_bootstrap_password();

        let insert_user = Query::insert()
            .into_table(Users::Table)
            .columns([
                Users::Username,
                Users::Email,
                Users::PasswordHash,
                Users::FirstName,
                Users::LastName,
                Users::IsSuperuser,
                Users::IsStaff,
                Users::IsActive,
                Users::CreatedAt,
                Users::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                "admin@localhost".into(),
                password_hash.into(),
                "".into(),
                "".into(),
                true.into(),
                true.into(),
                true.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_user).await?;

        // First row in a fresh table: the bootstrap user id is 1.
        let insert_profile = Query::insert()
            .into_table(UserProfiles::Table)
            .columns([
                UserProfiles::UserId,
                UserProfiles::Bio,
                UserProfiles::CanRevokeAdmins,
                UserProfiles::MemorableInformation,
                UserProfiles::CreatedAt,
                UserProfiles::UpdatedAt,
            ])
            .values_panic([
                1.into(),
                "".into(),
                true.into(),
                "".into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_profile).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountHistories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminActivityLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PasswordResetAttempts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PasswordResetTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    IsSuperuser,
    IsStaff,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserProfiles {
    Table,
    Id,
    UserId,
    ProfilePicture,
    Bio,
    CanRevokeAdmins,
    MemorableInformation,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PasswordResetTokens {
    Table,
    Id,
    UserId,
    Token,
    CreatedAt,
    ExpiresAt,
    IsUsed,
}

#[derive(Iden)]
enum PasswordResetAttempts {
    Table,
    Id,
    Email,
    CreatedAt,
}

#[derive(Iden)]
enum AdminActivityLogs {
    Table,
    Id,
    UserId,
    Action,
    TargetUserId,
    Description,
    IpAddress,
    CreatedAt,
}

#[derive(Iden)]
enum AccountHistories {
    Table,
    Id,
    UserId,
    EventType,
    PerformedBy,
    Description,
    IpAddress,
    CreatedAt,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    UserId,
    FullName,
    Email,
    Service,
    BookingDate,
    BookingTime,
    Notes,
    Status,
    CreatedAt,
    UpdatedAt,
}
