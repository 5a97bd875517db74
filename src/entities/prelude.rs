pub use super::account_histories::Entity as AccountHistories;
pub use super::admin_activity_logs::Entity as AdminActivityLogs;
pub use super::bookings::Entity as Bookings;
pub use super::password_reset_attempts::Entity as PasswordResetAttempts;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::user_profiles::Entity as UserProfiles;
pub use super::users::Entity as Users;
