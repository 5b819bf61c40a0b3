use argon2::PasswordHash as Argon2PasswordHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::ValidateEmail;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ValueObjectError {
  #[error("Invalid email format: {0}")]
  InvalidEmail(String),

  #[error("Password must not be empty")]
  EmptyPassword,

  #[error("Password is too long (maximum {max} characters)")]
  PasswordTooLong { max: usize },

  #[error("Invalid password hash format")]
  InvalidPasswordHash,

  #[error("Unknown role: {0}")]
  UnknownRole(String),
}

// ============================================================================
// Email Value Object
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
  /// Creates a new Email after validation, normalized to lowercase
  pub fn new(email: impl Into<String>) -> Result<Self, ValueObjectError> {
    let email = email.into();
    let trimmed = email.trim();

    if trimmed.is_empty() || !trimmed.validate_email() {
      return Err(ValueObjectError::InvalidEmail(email));
    }

    Ok(Self(trimmed.to_lowercase()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for Email {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Email {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

// ============================================================================
// Password Value Object (Plain Password - Never Stored)
// ============================================================================

/// Plaintext password. The buffer is wiped when dropped.
///
/// Only emptiness and an upper bound are checked here; the minimum length is a
/// sign-up policy owned by the auth service so that sign-in still accepts
/// passwords created under an older policy.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
  pub const MAX_LENGTH: usize = 128;

  pub fn new(password: impl Into<String>) -> Result<Self, ValueObjectError> {
    let password = password.into();

    if password.is_empty() {
      return Err(ValueObjectError::EmptyPassword);
    }

    if password.chars().count() > Self::MAX_LENGTH {
      return Err(ValueObjectError::PasswordTooLong {
        max: Self::MAX_LENGTH,
      });
    }

    Ok(Self(password))
  }

  /// Number of characters (not bytes) in the password
  pub fn len(&self) -> usize {
    self.0.chars().count()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Returns the password as a string slice (use with caution)
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Password {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Password(***)")
  }
}

// ============================================================================
// PasswordHash Value Object (PHC string, salt embedded)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
  /// Wraps an existing PHC-format hash string after checking it parses
  pub fn from_hash(hash: impl Into<String>) -> Result<Self, ValueObjectError> {
    let hash = hash.into();

    Argon2PasswordHash::new(&hash).map_err(|_| ValueObjectError::InvalidPasswordHash)?;

    Ok(Self(hash))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

// ============================================================================
// Role Value Object
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  Standard,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Standard => "standard",
    }
  }

  pub fn is_admin(&self) -> bool {
    matches!(self, Role::Admin)
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "standard" => Ok(Role::Standard),
      _ => Err(ValueObjectError::UnknownRole(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_email_validation() {
    assert!(Email::new("user@example.com").is_ok());
    assert!(Email::new("").is_err());
    assert!(Email::new("   ").is_err());
    assert!(Email::new("not-an-email").is_err());
  }

  #[test]
  fn test_email_normalization() {
    let email = Email::new("  Doctor.Who@Example.COM ").unwrap();
    assert_eq!(email.as_str(), "doctor.who@example.com");
  }

  #[test]
  fn test_password_rejects_empty_and_oversized() {
    assert!(matches!(
      Password::new(""),
      Err(ValueObjectError::EmptyPassword)
    ));
    assert!(matches!(
      Password::new("x".repeat(Password::MAX_LENGTH + 1)),
      Err(ValueObjectError::PasswordTooLong { .. })
    ));
    assert_eq!(Password::new("short").unwrap().len(), 5);
  }

  #[test]
  fn test_password_debug_is_redacted() {
    let password = Password::new("hunter22").unwrap();
    assert_eq!(format!("{:?}", password), "Password(***)");
  }

  #[test]
  fn test_password_hash_rejects_garbage() {
    assert!(PasswordHash::from_hash("plaintext").is_err());
  }

  #[test]
  fn test_role_parsing_and_default() {
    assert_eq!(Role::default(), Role::Standard);
    assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("standard".parse::<Role>().unwrap(), Role::Standard);
    assert!("root".parse::<Role>().is_err());
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
  }
}
