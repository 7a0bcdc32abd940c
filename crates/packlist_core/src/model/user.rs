//! User account record.
//!
//! Authentication lives outside core; a `User` row only anchors ownership
//! and list membership.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Lower-cased login email, unique across users.
    pub email: String,
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidEmail(String),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
        }
    }
}

impl Error for UserValidationError {}

/// Trims and lower-cases an email, rejecting values that do not look like one.
pub fn normalize_email(value: &str) -> Result<String, UserValidationError> {
    let normalized = value.trim().to_ascii_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(UserValidationError::InvalidEmail(value.trim().to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, UserValidationError};

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(
            normalize_email("  Hiker@Example.COM ").unwrap(),
            "hiker@example.com"
        );
    }

    #[test]
    fn normalize_email_rejects_missing_domain() {
        let err = normalize_email("hiker@").unwrap_err();
        assert_eq!(err, UserValidationError::InvalidEmail("hiker@".to_string()));
    }
}
