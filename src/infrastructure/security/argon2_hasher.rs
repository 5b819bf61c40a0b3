use argon2::password_hash::SaltString;
use argon2::{
  Algorithm, Argon2, Params, Version,
  password_hash::{
    PasswordHash as Argon2PasswordHash, PasswordHasher as Argon2PasswordHasherTrait,
    PasswordVerifier,
  },
};
use async_trait::async_trait;

use crate::domain::auth::errors::{AuthError, HashError};
use crate::domain::auth::ports::PasswordHasher;
use crate::domain::auth::value_objects::{Password, PasswordHash};

/// Argon2id password hasher implementation
///
/// Default parameters:
/// - Memory cost: 19 MiB (19456 KiB)
/// - Time cost: 2 iterations
/// - Parallelism: 1 thread
///
/// Hashing and verification run on tokio's blocking pool so that a burst of
/// sign-ups does not stall other requests on the async workers.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
  argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
  pub const DEFAULT_MEMORY_COST: u32 = 19456;
  pub const DEFAULT_TIME_COST: u32 = 2;

  /// Creates a hasher with the default work factor
  pub fn new() -> Result<Self, AuthError> {
    Self::with_cost(Self::DEFAULT_MEMORY_COST, Self::DEFAULT_TIME_COST)
  }

  /// Creates a hasher with a custom work factor (memory in KiB, iterations)
  pub fn with_cost(memory_cost: u32, time_cost: u32) -> Result<Self, AuthError> {
    let params = Params::new(memory_cost, time_cost, 1, Some(32)).map_err(|e| {
      AuthError::Hash(HashError::HashingFailed(format!(
        "Failed to create Argon2 params: {}",
        e
      )))
    })?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    Ok(Self { argon2 })
  }

  /// Minimal work factor, for tests only
  #[cfg(test)]
  pub fn for_tests() -> Self {
    Self::with_cost(Params::MIN_M_COST.max(64), 1).expect("valid test params")
  }
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
  async fn hash(&self, password: &Password) -> Result<PasswordHash, AuthError> {
    let argon2 = self.argon2.clone();
    let password = password.clone();

    let hash = tokio::task::spawn_blocking(move || {
      // Generate a random salt using the OS's cryptographically secure RNG
      let salt = SaltString::generate(&mut rand::rngs::OsRng);
      argon2
        .hash_password(password.as_str().as_bytes(), &salt)
        .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| AuthError::Hash(HashError::HashingFailed(e.to_string())))?
    .map_err(|e| AuthError::Hash(HashError::from(e)))?;

    PasswordHash::from_hash(hash).map_err(|e| {
      AuthError::Hash(HashError::HashingFailed(format!(
        "Invalid hash format: {}",
        e
      )))
    })
  }

  /// Uses constant-time comparison (built into argon2's verify_password)
  async fn verify(
    &self,
    password: &Password,
    hashed_password: &PasswordHash,
  ) -> Result<bool, AuthError> {
    let argon2 = self.argon2.clone();
    let password = password.clone();
    let hashed_password = hashed_password.clone();

    tokio::task::spawn_blocking(move || {
      let parsed_hash = Argon2PasswordHash::new(hashed_password.as_str()).map_err(|e| {
        AuthError::Hash(HashError::VerificationFailed(format!(
          "Invalid hash format: {}",
          e
        )))
      })?;

      // Parameters come from the stored hash, not from `argon2`
      match argon2.verify_password(password.as_str().as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hash(HashError::VerificationFailed(format!(
          "Password verification failed: {}",
          e
        )))),
      }
    })
    .await
    .map_err(|e| AuthError::Hash(HashError::VerificationFailed(e.to_string())))?
  }
}
