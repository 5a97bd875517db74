use crate::db::{CreateOutcome, DemoteOutcome, NewUser, Store};
use crate::entities::{user_profiles, users};
use crate::services::{AccountError, AccountEvent, AdminAction, AuditService};

/// Input for self-service registration.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub memorable_information: String,
}

/// Input for admin-driven account creation.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub can_revoke_admins: bool,
    pub memorable_information: String,
}

/// Account lifecycle and privilege management.
///
/// Mutations commit first; audit rows are appended best-effort afterwards
/// and never roll the mutation back.
#[derive(Clone)]
pub struct AccountService {
    store: Store,
    audit: AuditService,
}

impl AccountService {
    #[must_use]
    pub const fn new(store: Store, audit: AuditService) -> Self {
        Self { store, audit }
    }

    /// Self-service registration: user + profile in one transaction, then a
    /// best-effort `created` history row with no performer.
    pub async fn register(
        &self,
        input: RegisterInput,
        ip_address: &str,
    ) -> Result<users::Model, AccountError> {
        let user = self
            .create_account(
                NewUser {
                    username: input.username,
                    email: input.email,
                    password: input.password,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    is_superuser: false,
                    is_staff: false,
                    can_revoke_admins: true,
                    memorable_information: input.memorable_information,
                },
            )
            .await?;

        self.audit
            .record_account_event(
                Some(user.id),
                AccountEvent::Created,
                None,
                &format!("Account '{}' registered", user.username),
                ip_address,
            )
            .await;

        Ok(user)
    }

    /// Create a superuser account on behalf of `requestor`.
    pub async fn create_admin(
        &self,
        requestor: &users::Model,
        input: CreateAccountInput,
        ip_address: &str,
    ) -> Result<users::Model, AccountError> {
        require_superuser(requestor)?;

        let user = self
            .create_account(NewUser {
                username: input.username,
                email: input.email,
                password: input.password,
                first_name: input.first_name,
                last_name: input.last_name,
                is_superuser: true,
                is_staff: true,
                can_revoke_admins: input.can_revoke_admins,
                memorable_information: input.memorable_information,
            })
            .await?;

        self.audit
            .record_admin_action(
                Some(requestor.id),
                AdminAction::CreateAdmin,
                Some(user.id),
                &format!("Created admin account '{}'", user.username),
                ip_address,
            )
            .await;
        self.audit
            .record_account_event(
                Some(user.id),
                AccountEvent::Created,
                Some(requestor.id),
                &format!("Admin account '{}' created by '{}'", user.username, requestor.username),
                ip_address,
            )
            .await;

        Ok(user)
    }

    /// Create a non-privileged account on behalf of `requestor`.
    pub async fn create_user_account(
        &self,
        requestor: &users::Model,
        input: CreateAccountInput,
        ip_address: &str,
    ) -> Result<users::Model, AccountError> {
        require_superuser(requestor)?;

        let user = self
            .create_account(NewUser {
                username: input.username,
                email: input.email,
                password: input.password,
                first_name: input.first_name,
                last_name: input.last_name,
                is_superuser: false,
                is_staff: false,
                can_revoke_admins: input.can_revoke_admins,
                memorable_information: input.memorable_information,
            })
            .await?;

        self.audit
            .record_admin_action(
                Some(requestor.id),
                AdminAction::Other,
                Some(user.id),
                &format!("Created user account '{}'", user.username),
                ip_address,
            )
            .await;
        self.audit
            .record_account_event(
                Some(user.id),
                AccountEvent::Created,
                Some(requestor.id),
                &format!("Account '{}' created by '{}'", user.username, requestor.username),
                ip_address,
            )
            .await;

        Ok(user)
    }

    /// Demote an admin. Self-revocation and non-admin targets are user
    /// errors and must not mutate anything.
    pub async fn revoke_admin_privileges(
        &self,
        requestor: &users::Model,
        target_id: i32,
        ip_address: &str,
    ) -> Result<(), AccountError> {
        require_superuser(requestor)?;
        self.require_can_revoke(requestor).await?;

        if target_id == requestor.id {
            return Err(AccountError::validation(
                "You cannot revoke your own admin privileges.",
            ));
        }

        let username = match self.store.users().demote_superuser(target_id).await? {
            DemoteOutcome::Demoted(username) => username,
            DemoteOutcome::NotFound => {
                return Err(AccountError::not_found("User not found."));
            }
            DemoteOutcome::NotAdmin => {
                return Err(AccountError::validation("User is not an admin."));
            }
        };

        self.audit
            .record_admin_action(
                Some(requestor.id),
                AdminAction::RevokeAdmin,
                Some(target_id),
                &format!("Revoked admin privileges from '{username}'"),
                ip_address,
            )
            .await;
        self.audit
            .record_account_event(
                Some(target_id),
                AccountEvent::Revoked,
                Some(requestor.id),
                &format!("Admin privileges revoked from '{username}' by '{}'", requestor.username),
                ip_address,
            )
            .await;

        Ok(())
    }

    pub async fn list_admins(
        &self,
        requestor: &users::Model,
    ) -> Result<Vec<users::Model>, AccountError> {
        require_superuser(requestor)?;
        Ok(self.store.users().list_by_superuser(true).await?)
    }

    pub async fn list_users(
        &self,
        requestor: &users::Model,
    ) -> Result<Vec<users::Model>, AccountError> {
        require_superuser(requestor)?;
        Ok(self.store.users().list_by_superuser(false).await?)
    }

    /// Idempotent upsert of the caller's own profile picture.
    pub async fn update_profile_picture(
        &self,
        user_id: i32,
        url: &str,
    ) -> Result<(), AccountError> {
        self.store.users().set_profile_picture(user_id, url).await?;
        Ok(())
    }

    pub async fn get_profile(
        &self,
        user_id: i32,
    ) -> Result<Option<user_profiles::Model>, AccountError> {
        Ok(self.store.users().get_profile(user_id).await?)
    }

    async fn create_account(&self, new: NewUser) -> Result<users::Model, AccountError> {
        match self.store.users().create_with_profile(new).await? {
            CreateOutcome::Created(user) => Ok(user),
            CreateOutcome::DuplicateUsername => Err(AccountError::conflict(
                "A user with that username already exists.",
            )),
            CreateOutcome::DuplicateEmail => Err(AccountError::conflict(
                "A user with that email already exists.",
            )),
        }
    }

    async fn require_can_revoke(&self, requestor: &users::Model) -> Result<(), AccountError> {
        let can_revoke = self
            .store
            .users()
            .get_profile(requestor.id)
            .await?
            .is_none_or(|profile| profile.can_revoke_admins);

        if can_revoke {
            Ok(())
        } else {
            Err(AccountError::permission(
                "You do not have permission to revoke admin privileges.",
            ))
        }
    }
}

/// The single superuser gate every privileged operation goes through.
pub fn require_superuser(user: &users::Model) -> Result<(), AccountError> {
    if user.is_superuser && user.is_active {
        Ok(())
    } else {
        Err(AccountError::permission(
            "Only administrators may perform this action.",
        ))
    }
}
