use regex::Regex;
use std::sync::LazyLock;

use super::ApiError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex compiles"));

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if trimmed.len() < 3 || trimmed.len() > 150 {
        return Err(ApiError::validation(
            "Username must be between 3 and 150 characters",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_' || c == '@' || c == '+')
    {
        return Err(ApiError::validation(
            "Username may only contain letters, numbers, and @/./+/-/_ characters",
        ));
    }

    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    if trimmed.len() > 254 || !EMAIL_RE.is_match(trimmed) {
        return Err(ApiError::validation("Enter a valid email address"));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    Ok(password)
}

pub fn validate_person_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.len() > 150 {
        return Err(ApiError::validation(format!(
            "{} must be 150 characters or less",
            field
        )));
    }

    Ok(())
}

pub fn validate_picture_url(url: &str) -> Result<&str, ApiError> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Profile picture URL is required"));
    }

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ApiError::validation(
            "Profile picture must be an http(s) URL",
        ));
    }

    if trimmed.len() > 500 {
        return Err(ApiError::validation(
            "Profile picture URL must be 500 characters or less",
        ));
    }

    Ok(trimmed)
}

pub fn validate_booking_status(status: &str) -> Result<&str, ApiError> {
    const ALLOWED: [&str; 4] = ["pending", "confirmed", "cancelled", "completed"];

    if ALLOWED.contains(&status) {
        Ok(status)
    } else {
        Err(ApiError::validation(format!(
            "Invalid status '{}'. Must be one of: pending, confirmed, cancelled, completed",
            status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("first.last-2024").is_ok());
        assert!(validate_username("  spaced  ").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has spaces").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_validate_picture_url() {
        assert!(validate_picture_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_picture_url("http://example.com/a.png").is_ok());
        assert!(validate_picture_url("ftp://example.com/a.png").is_err());
        assert!(validate_picture_url("").is_err());
    }

    #[test]
    fn test_validate_booking_status() {
        assert!(validate_booking_status("pending").is_ok());
        assert!(validate_booking_status("confirmed").is_ok());
        assert!(validate_booking_status("done").is_err());
        assert!(validate_booking_status("Pending").is_err());
    }
}
