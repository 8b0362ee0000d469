use crate::enums::UserRole;
use crate::error::ValidationError;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok()
});

const PASSWORD_POLICY: &str =
    "Password must be at least 8 characters long and contain at least one letter and one number";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
}

/// Tokens and profile returned by a successful login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// # Errors
    /// Returns an error when either field is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::new(
                "username",
                "Username and password are required",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Applies the backend's registration rules.
    ///
    /// # Errors
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::missing("username"));
        }
        if self.email.is_empty() {
            return Err(ValidationError::missing("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::missing("password"));
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::new("email", "Invalid email format"));
        }
        check_password_policy("password", &self.password)
    }
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Passwords are at least 8 ASCII alphanumerics with at least one letter and one digit.
///
/// # Errors
/// Returns a [`ValidationError`] for `field` when the policy is not met.
pub fn check_password_policy(field: &str, password: &str) -> Result<(), ValidationError> {
    let ok = password.len() >= 8
        && password.chars().all(|c| c.is_ascii_alphanumeric())
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new(field, PASSWORD_POLICY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: "analyst1".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(request("a.b@example.org", "secret123").validate().is_ok());
        assert_eq!(
            request("not-an-email", "secret123")
                .validate()
                .unwrap_err()
                .message,
            "Invalid email format"
        );
        assert_eq!(
            request("a@b.io", "").validate().unwrap_err().message,
            "Missing required field: password"
        );
    }

    #[test]
    fn test_password_policy() {
        assert!(check_password_policy("password", "abcd1234").is_ok());
        assert!(check_password_policy("password", "abcdefgh").is_err());
        assert!(check_password_policy("password", "12345678").is_err());
        assert!(check_password_policy("password", "abc123").is_err());
        assert!(check_password_policy("password", "abcd 1234").is_err());
    }

    #[test]
    fn test_login_payload_without_timestamps() {
        let json = serde_json::json!({
            "access_token": "a.b.c",
            "refresh_token": "d.e.f",
            "user": {
                "id": "0b7d9c57-3c0e-4b0e-8d5b-9f6f3a4c2e10",
                "username": "admin",
                "email": "admin@example.com",
                "role": "admin"
            }
        });
        let session: AuthSession = serde_json::from_value(json).unwrap();
        assert!(session.user.role.is_admin());
        assert!(session.user.last_login.is_none());
    }
}
