use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::value_objects::Role;

/// User record as held by the credential store.
///
/// Deliberately not `Serialize`: anything leaving the service goes through
/// [`UserView`], which has no password field.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
  /// Unique identifier for the user
  pub id: Uuid,
  /// Lowercased email address (unique)
  pub email: String,
  /// Argon2id PHC string
  pub password_hash: String,
  pub role: Role,
  pub specialties: BTreeSet<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  /// Creates a new standard user
  pub fn new(email: String, password_hash: String, specialties: BTreeSet<String>) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      email,
      password_hash,
      role: Role::default(),
      specialties,
      created_at: now,
      updated_at: now,
    }
  }

  /// Creates a user from database fields (for reconstruction)
  pub fn from_db(
    id: Uuid,
    email: String,
    password_hash: String,
    role: Role,
    specialties: BTreeSet<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      email,
      password_hash,
      role,
      specialties,
      created_at,
      updated_at,
    }
  }

  /// Applies an admin patch; absent fields keep their current value.
  /// Returns whether anything changed.
  pub fn apply(&mut self, patch: UserPatch) -> bool {
    let mut changed = false;

    if let Some(role) = patch.role {
      if role != self.role {
        self.role = role;
        changed = true;
      }
    }

    if let Some(specialties) = patch.specialties {
      if specialties != self.specialties {
        self.specialties = specialties;
        changed = true;
      }
    }

    if changed {
      self.updated_at = Utc::now();
    }

    changed
  }

  pub fn view(&self) -> UserView {
    UserView::from(self)
  }
}

/// Caller-facing projection of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
  pub id: Uuid,
  pub email: String,
  pub role: Role,
  pub specialties: BTreeSet<String>,
  pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
  fn from(user: &User) -> Self {
    Self {
      id: user.id,
      email: user.email.clone(),
      role: user.role,
      specialties: user.specialties.clone(),
      created_at: user.created_at,
    }
  }
}

/// Partial update of a user. `None` means "leave as is"; `Some(empty set)`
/// clears the specialties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
  pub role: Option<Role>,
  pub specialties: Option<BTreeSet<String>>,
}

/// Identity asserted by a verified session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: Uuid,
  pub role: Role,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> User {
    User::new(
      "nurse@example.com".to_string(),
      "$argon2id$v=19$m=16,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_string(),
      BTreeSet::from(["cardiology".to_string()]),
    )
  }

  #[test]
  fn test_new_user_defaults_to_standard() {
    let user = user();
    assert_eq!(user.role, Role::Standard);
    assert_eq!(user.created_at, user.updated_at);
  }

  #[test]
  fn test_apply_empty_patch_keeps_values() {
    let mut user = user();
    let before = user.clone();

    assert!(!user.apply(UserPatch::default()));
    assert_eq!(user, before);
  }

  #[test]
  fn test_apply_explicit_empty_specialties_clears() {
    let mut user = user();

    let changed = user.apply(UserPatch {
      role: None,
      specialties: Some(BTreeSet::new()),
    });

    assert!(changed);
    assert!(user.specialties.is_empty());
    assert_eq!(user.role, Role::Standard);
  }

  #[test]
  fn test_apply_role_only() {
    let mut user = user();

    user.apply(UserPatch {
      role: Some(Role::Admin),
      specialties: None,
    });

    assert_eq!(user.role, Role::Admin);
    assert!(user.specialties.contains("cardiology"));
  }

  #[test]
  fn test_view_has_no_password_field() {
    let json = serde_json::to_value(user().view()).unwrap();
    let object = json.as_object().unwrap();

    assert!(!object.contains_key("password"));
    assert!(!object.contains_key("password_hash"));
    assert_eq!(object["email"], "nurse@example.com");
  }
}
