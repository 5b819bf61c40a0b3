use super::errors::AuthError;
use super::value_objects::Role;

/// Capability check shared by every admin-gated operation
pub fn require_admin(caller: Role) -> Result<(), AuthError> {
  if caller.is_admin() {
    Ok(())
  } else {
    Err(AuthError::Forbidden)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_require_admin() {
    assert!(require_admin(Role::Admin).is_ok());
    assert!(matches!(
      require_admin(Role::Standard),
      Err(AuthError::Forbidden)
    ));
  }
}
