use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tokio::task;

use crate::db::now_utc;
use crate::entities::{user_profiles, users};

/// Input for a user-plus-profile creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub can_revoke_admins: bool,
    pub memorable_information: String,
}

/// Outcome of a transactional user creation.
pub enum CreateOutcome {
    Created(users::Model),
    DuplicateUsername,
    DuplicateEmail,
}

/// Outcome of a transactional superuser demotion.
#[derive(Debug, PartialEq, Eq)]
pub enum DemoteOutcome {
    Demoted(String),
    NotFound,
    NotAdmin,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn get_profile(&self, user_id: i32) -> Result<Option<user_profiles::Model>> {
        user_profiles::Entity::find()
            .filter(user_profiles::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query user profile")
    }

    /// Create a user and its profile in one transaction.
    ///
    /// Uniqueness is checked inside the transaction; the unique constraints
    /// on username/email are the backstop.
    pub async fn create_with_profile(&self, new: NewUser) -> Result<CreateOutcome> {
        let password = new.password.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let txn = self.conn.begin().await?;

        let username_taken = users::Entity::find()
            .filter(users::Column::Username.eq(new.username.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if username_taken {
            txn.rollback().await?;
            return Ok(CreateOutcome::DuplicateUsername);
        }

        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(new.email.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if email_taken {
            txn.rollback().await?;
            return Ok(CreateOutcome::DuplicateEmail);
        }

        let now = now_utc();

        let user = users::ActiveModel {
            username: Set(new.username),
            email: Set(new.email),
            password_hash: Set(password_hash),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            is_superuser: Set(new.is_superuser),
            is_staff: Set(new.is_staff),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        user_profiles::ActiveModel {
            user_id: Set(user.id),
            profile_picture: Set(None),
            bio: Set(String::new()),
            can_revoke_admins: Set(new.can_revoke_admins),
            memorable_information: Set(new.memorable_information),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(CreateOutcome::Created(user))
    }

    /// Clear superuser/staff flags on the target inside one transaction.
    ///
    /// The superuser check happens on the row read in the same transaction,
    /// so two concurrent revocations cannot both succeed.
    pub async fn demote_superuser(&self, target_id: i32) -> Result<DemoteOutcome> {
        let txn = self.conn.begin().await?;

        let Some(target) = users::Entity::find_by_id(target_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(DemoteOutcome::NotFound);
        };

        if !target.is_superuser {
            txn.rollback().await?;
            return Ok(DemoteOutcome::NotAdmin);
        }

        let username = target.username.clone();
        let mut active: users::ActiveModel = target.into();
        active.is_superuser = Set(false);
        active.is_staff = Set(false);
        active.updated_at = Set(now_utc());
        active.update(&txn).await?;

        txn.commit().await?;

        Ok(DemoteOutcome::Demoted(username))
    }

    /// Verify password for a user.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        if !user.is_active {
            return Ok(false);
        }

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Upsert the caller's own profile picture.
    pub async fn set_profile_picture(&self, user_id: i32, url: &str) -> Result<()> {
        let now = now_utc();

        match self.get_profile(user_id).await? {
            Some(profile) => {
                let mut active: user_profiles::ActiveModel = profile.into();
                active.profile_picture = Set(Some(url.to_string()));
                active.updated_at = Set(now);
                active.update(&self.conn).await?;
            }
            // Profiles are created with their user; this arm only fires for
            // rows predating that invariant.
            None => {
                user_profiles::ActiveModel {
                    user_id: Set(user_id),
                    profile_picture: Set(Some(url.to_string())),
                    bio: Set(String::new()),
                    can_revoke_admins: Set(true),
                    memorable_information: Set(String::new()),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.conn)
                .await?;
            }
        }

        Ok(())
    }

    /// Users filtered by superuser flag, newest-joined first.
    pub async fn list_by_superuser(&self, is_superuser: bool) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .filter(users::Column::IsSuperuser.eq(is_superuser))
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }
}

/// Hash a password using Argon2id with default params.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
