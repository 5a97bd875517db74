use serde::Serialize;

use crate::entities::{user_profiles, users};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Public projection of a user row. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: String,
}

impl From<users::Model> for UserDto {
    fn from(user: users::Model) -> Self {
        let full_name = format!("{} {}", user.first_name, user.last_name)
            .trim()
            .to_string();

        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            is_superuser: user.is_superuser,
            is_staff: user.is_staff,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub profile_picture: Option<String>,
    pub bio: String,
    pub can_revoke_admins: bool,
}

impl From<user_profiles::Model> for ProfileDto {
    fn from(profile: user_profiles::Model) -> Self {
        Self {
            profile_picture: profile.profile_picture,
            bio: profile.bio,
            can_revoke_admins: profile.can_revoke_admins,
        }
    }
}

/// Login/registration payload: the user plus a fresh credential pair.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserDto,
    pub profile: Option<ProfileDto>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProfilePictureResponse {
    pub message: String,
    pub profile_picture: String,
}

#[derive(Debug, Serialize)]
pub struct TokenValidity {
    pub valid: bool,
    pub message: String,
}
