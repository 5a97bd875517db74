pub mod prelude;

pub mod account_histories;
pub mod admin_activity_logs;
pub mod bookings;
pub mod password_reset_attempts;
pub mod password_reset_tokens;
pub mod user_profiles;
pub mod users;
