use async_trait::async_trait;

use super::entities::{Identity, User};
use super::errors::AuthError;
use super::value_objects::{Email, Password, PasswordHash};

/// Credential store: persistence of user records
#[async_trait]
pub trait UserRepository: Send + Sync {
  /// Inserts a new user. Email uniqueness is enforced atomically by the store;
  /// a second insert for the same email fails with
  /// `RepositoryError::DuplicateKey`.
  async fn create(&self, user: User) -> Result<User, AuthError>;

  async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError>;

  /// Overwrites role and specialties of an existing user
  async fn update(&self, user: User) -> Result<User, AuthError>;

  /// Lists all users, oldest first
  async fn list(&self) -> Result<Vec<User>, AuthError>;
}

/// Service trait for password hashing operations
#[async_trait]
pub trait PasswordHasher: Send + Sync {
  /// Hashes a plain text password with a fresh random salt
  async fn hash(&self, password: &Password) -> Result<PasswordHash, AuthError>;

  /// Verifies a plain text password against a stored hash.
  /// A mismatch is `Ok(false)`, never an error.
  async fn verify(
    &self,
    password: &Password,
    hashed_password: &PasswordHash,
  ) -> Result<bool, AuthError>;
}

/// Signs and verifies stateless session tokens
pub trait TokenService: Send + Sync {
  fn issue(&self, identity: &Identity) -> Result<String, AuthError>;

  /// Fails with `AuthError::InvalidToken` on a bad signature, malformed
  /// payload or empty token
  fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}
