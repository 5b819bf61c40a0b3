use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::authorization::require_admin;
use super::entities::{Identity, User, UserPatch, UserView};
use super::errors::{AuthError, RepositoryError, ValidationError};
use super::ports::{PasswordHasher, TokenService, UserRepository};
use super::value_objects::{Email, Password, PasswordHash, Role};
use crate::domain::events::EventEmitter;

/// Event emitted after a user record is created
pub const USER_SIGNUP_EVENT: &str = "user/signup";

/// Policy knobs for the auth service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
  /// Minimum password length (characters) accepted at sign-up
  pub password_min_length: usize,
}

impl Default for AuthServiceConfig {
  fn default() -> Self {
    Self {
      password_min_length: 8,
    }
  }
}

/// A user together with a freshly issued session token
#[derive(Debug, Clone)]
pub struct AuthSession {
  pub user: UserView,
  pub token: String,
}

/// Authentication service implementing core business logic
pub struct AuthService {
  user_repo: Arc<dyn UserRepository>,
  password_hasher: Arc<dyn PasswordHasher>,
  token_service: Arc<dyn TokenService>,
  events: Arc<dyn EventEmitter>,
  config: AuthServiceConfig,
}

impl AuthService {
  pub fn new(
    user_repo: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    token_service: Arc<dyn TokenService>,
    events: Arc<dyn EventEmitter>,
    config: AuthServiceConfig,
  ) -> Self {
    Self {
      user_repo,
      password_hasher,
      token_service,
      events,
      config,
    }
  }

  /// Hashes a plaintext password with a random salt embedded in the output
  ///
  /// # Errors
  /// Returns `AuthError::Encoding` for empty or oversized input
  pub async fn hash_password(&self, plaintext: &str) -> Result<PasswordHash, AuthError> {
    let password = Password::new(plaintext).map_err(|e| AuthError::Encoding(e.to_string()))?;
    self.password_hasher.hash(&password).await
  }

  /// Checks a plaintext password against a stored hash. Mismatch, including
  /// input that could never have been hashed, is `Ok(false)`.
  pub async fn verify_password(
    &self,
    plaintext: &str,
    hash: &PasswordHash,
  ) -> Result<bool, AuthError> {
    match Password::new(plaintext) {
      Ok(password) => self.password_hasher.verify(&password, hash).await,
      Err(_) => Ok(false),
    }
  }

  /// Registers a new standard user and signs them in
  ///
  /// The `user/signup` event is emitted after the record is stored. A failed
  /// emission is logged and does not undo the sign-up.
  ///
  /// # Errors
  /// - `AuthError::Validation` if the password is shorter than the policy
  /// - `AuthError::EmailAlreadyExists` if the email is taken
  pub async fn sign_up(
    &self,
    email: Email,
    password: Password,
    specialties: BTreeSet<String>,
  ) -> Result<AuthSession, AuthError> {
    if password.len() < self.config.password_min_length {
      return Err(AuthError::Validation(ValidationError::PasswordTooShort {
        min: self.config.password_min_length,
      }));
    }

    // Cheap pre-check so duplicates skip the expensive hash; the store's
    // unique constraint is what actually decides races.
    if self.user_repo.find_by_email(&email).await?.is_some() {
      return Err(AuthError::EmailAlreadyExists);
    }

    let password_hash = self.password_hasher.hash(&password).await?;

    let user = User::new(
      email.into_inner(),
      password_hash.into_inner(),
      normalize_specialties(specialties),
    );

    let created_user = match self.user_repo.create(user).await {
      Ok(user) => user,
      Err(AuthError::Repository(RepositoryError::DuplicateKey(_))) => {
        return Err(AuthError::EmailAlreadyExists);
      }
      Err(e) => return Err(e),
    };

    tracing::info!(user_id = %created_user.id, "User signed up");

    let mut payload = Map::new();
    payload.insert("email".to_string(), Value::String(created_user.email.clone()));
    match self.events.emit(USER_SIGNUP_EVENT, payload).await {
      Ok(event_id) => tracing::debug!(%event_id, "Queued {} event", USER_SIGNUP_EVENT),
      Err(e) => tracing::error!(
        user_id = %created_user.id,
        "Failed to emit {} event: {}",
        USER_SIGNUP_EVENT,
        e
      ),
    }

    self.session_for(&created_user)
  }

  /// Authenticates a user by email and password
  ///
  /// # Errors
  /// - `AuthError::UserNotFound` if no user has this email
  /// - `AuthError::InvalidCredentials` if the password does not match
  pub async fn sign_in(&self, email: Email, password: Password) -> Result<AuthSession, AuthError> {
    let user = self
      .user_repo
      .find_by_email(&email)
      .await?
      .ok_or(AuthError::UserNotFound)?;

    let password_hash = PasswordHash::from_hash(&user.password_hash).map_err(|_| {
      tracing::error!(user_id = %user.id, "Stored password hash is unreadable");
      AuthError::Hash(super::errors::HashError::InvalidFormat)
    })?;

    if !self.password_hasher.verify(&password, &password_hash).await? {
      return Err(AuthError::InvalidCredentials);
    }

    self.session_for(&user)
  }

  /// Signs `{user_id, role}` with the process-wide secret
  pub fn issue_token(&self, identity: &Identity) -> Result<String, AuthError> {
    self.token_service.issue(identity)
  }

  /// Validates a session token and returns the identity it asserts
  ///
  /// # Errors
  /// Returns `AuthError::InvalidToken` if the token is empty, malformed or
  /// its signature does not match
  pub fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
    if token.trim().is_empty() {
      return Err(AuthError::InvalidToken);
    }
    self.token_service.verify(token)
  }

  /// Changes role and/or specialties of a user. Admin only.
  ///
  /// # Errors
  /// - `AuthError::Forbidden` if the caller is not an admin
  /// - `AuthError::UserNotFound` if no user has this email
  pub async fn update_user(
    &self,
    caller: Role,
    email: &Email,
    patch: UserPatch,
  ) -> Result<UserView, AuthError> {
    require_admin(caller)?;

    let mut user = self
      .user_repo
      .find_by_email(email)
      .await?
      .ok_or(AuthError::UserNotFound)?;

    let patch = UserPatch {
      role: patch.role,
      specialties: patch.specialties.map(normalize_specialties),
    };

    if !user.apply(patch) {
      return Ok(user.view());
    }

    let updated = match self.user_repo.update(user).await {
      Ok(user) => user,
      Err(AuthError::Repository(RepositoryError::NotFound)) => return Err(AuthError::UserNotFound),
      Err(e) => return Err(e),
    };

    tracing::info!(user_id = %updated.id, role = %updated.role, "User updated");

    Ok(updated.view())
  }

  /// Lists every user without password hashes. Admin only.
  pub async fn list_users(&self, caller: Role) -> Result<Vec<UserView>, AuthError> {
    require_admin(caller)?;

    let users = self.user_repo.list().await?;
    Ok(users.iter().map(UserView::from).collect())
  }

  fn session_for(&self, user: &User) -> Result<AuthSession, AuthError> {
    let token = self.issue_token(&Identity {
      user_id: user.id,
      role: user.role,
    })?;

    Ok(AuthSession {
      user: user.view(),
      token,
    })
  }
}

/// Trims entries and drops blanks
fn normalize_specialties(specialties: BTreeSet<String>) -> BTreeSet<String> {
  specialties
    .into_iter()
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::events::{EventData, EventError};
  use crate::infrastructure::persistence::memory::InMemoryUserRepository;
  use crate::infrastructure::security::{Argon2PasswordHasher, JwtTokenService};
  use async_trait::async_trait;
  use std::sync::Mutex;
  use uuid::Uuid;

  #[derive(Default)]
  struct RecordingEmitter {
    emitted: Mutex<Vec<(String, EventData)>>,
    fail: bool,
  }

  #[async_trait]
  impl EventEmitter for RecordingEmitter {
    async fn emit(&self, name: &str, data: EventData) -> Result<Uuid, EventError> {
      if self.fail {
        return Err(EventError::QueueClosed);
      }
      self.emitted.lock().unwrap().push((name.to_string(), data));
      Ok(Uuid::new_v4())
    }
  }

  struct Fixture {
    service: Arc<AuthService>,
    repo: Arc<InMemoryUserRepository>,
    emitter: Arc<RecordingEmitter>,
  }

  fn fixture_with(emitter: RecordingEmitter) -> Fixture {
    let repo = Arc::new(InMemoryUserRepository::new());
    let emitter = Arc::new(emitter);
    let service = Arc::new(AuthService::new(
      repo.clone(),
      Arc::new(Argon2PasswordHasher::for_tests()),
      Arc::new(JwtTokenService::new(b"test-secret", None)),
      emitter.clone(),
      AuthServiceConfig::default(),
    ));
    Fixture {
      service,
      repo,
      emitter,
    }
  }

  fn fixture() -> Fixture {
    fixture_with(RecordingEmitter::default())
  }

  fn email(s: &str) -> Email {
    Email::new(s).unwrap()
  }

  fn password(s: &str) -> Password {
    Password::new(s).unwrap()
  }

  async fn make_admin(f: &Fixture, address: &str) {
    let mut user = f.repo.find_by_email(&email(address)).await.unwrap().unwrap();
    user.role = Role::Admin;
    f.repo.update(user).await.unwrap();
  }

  #[tokio::test]
  async fn test_sign_up_then_sign_in() {
    let f = fixture();

    let signed_up = f
      .service
      .sign_up(
        email("Alice@Example.com"),
        password("correct horse"),
        BTreeSet::from([" triage ".to_string(), "".to_string()]),
      )
      .await
      .unwrap();

    assert_eq!(signed_up.user.email, "alice@example.com");
    assert_eq!(signed_up.user.role, Role::Standard);
    assert_eq!(
      signed_up.user.specialties,
      BTreeSet::from(["triage".to_string()])
    );

    let signed_in = f
      .service
      .sign_in(email("alice@example.com"), password("correct horse"))
      .await
      .unwrap();

    let identity = f.service.verify_token(&signed_in.token).unwrap();
    assert_eq!(identity.user_id, signed_up.user.id);
    assert_eq!(identity.role, Role::Standard);
  }

  #[tokio::test]
  async fn test_sign_up_emits_signup_event() {
    let f = fixture();

    f.service
      .sign_up(email("bob@example.com"), password("password1"), BTreeSet::new())
      .await
      .unwrap();

    let emitted = f.emitter.emitted.lock().unwrap();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].0, USER_SIGNUP_EVENT);
    assert_eq!(emitted[0].1["email"], "bob@example.com");
  }

  #[tokio::test]
  async fn test_sign_up_survives_emit_failure() {
    let f = fixture_with(RecordingEmitter {
      fail: true,
      ..Default::default()
    });

    let session = f
      .service
      .sign_up(email("carol@example.com"), password("password1"), BTreeSet::new())
      .await
      .unwrap();

    assert!(!session.token.is_empty());
    assert!(
      f.repo
        .find_by_email(&email("carol@example.com"))
        .await
        .unwrap()
        .is_some()
    );
  }

  #[tokio::test]
  async fn test_sign_up_rejects_short_password() {
    let f = fixture();

    let result = f
      .service
      .sign_up(email("dan@example.com"), password("short"), BTreeSet::new())
      .await;

    assert!(matches!(
      result,
      Err(AuthError::Validation(ValidationError::PasswordTooShort { min: 8 }))
    ));
    assert!(f.emitter.emitted.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_sign_up_rejects_duplicate_email() {
    let f = fixture();

    f.service
      .sign_up(email("erin@example.com"), password("password1"), BTreeSet::new())
      .await
      .unwrap();
    let result = f
      .service
      .sign_up(email("ERIN@example.com"), password("password2"), BTreeSet::new())
      .await;

    assert!(matches!(result, Err(AuthError::EmailAlreadyExists)));
  }

  #[tokio::test]
  async fn test_concurrent_sign_up_same_email_creates_one_user() {
    let f = fixture();

    let a = f.service.clone();
    let b = f.service.clone();
    let (first, second) = tokio::join!(
      tokio::spawn(async move {
        a.sign_up(email("race@example.com"), password("password1"), BTreeSet::new())
          .await
      }),
      tokio::spawn(async move {
        b.sign_up(email("race@example.com"), password("password2"), BTreeSet::new())
          .await
      }),
    );
    let results = [first.unwrap(), second.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
      results
        .iter()
        .any(|r| matches!(r, Err(AuthError::EmailAlreadyExists)))
    );
    assert_eq!(f.repo.list().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_sign_in_failures_are_distinguished_internally() {
    let f = fixture();
    f.service
      .sign_up(email("frank@example.com"), password("password1"), BTreeSet::new())
      .await
      .unwrap();

    let missing = f
      .service
      .sign_in(email("nobody@example.com"), password("password1"))
      .await;
    let wrong = f
      .service
      .sign_in(email("frank@example.com"), password("password2"))
      .await;

    assert!(matches!(missing, Err(AuthError::UserNotFound)));
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
  }

  #[tokio::test]
  async fn test_hash_and_verify_password() {
    let f = fixture();

    let hash = f.service.hash_password("s3cret-pass").await.unwrap();

    assert!(f.service.verify_password("s3cret-pass", &hash).await.unwrap());
    assert!(!f.service.verify_password("s3cret-pasS", &hash).await.unwrap());
    assert!(!f.service.verify_password("", &hash).await.unwrap());
    assert!(matches!(
      f.service.hash_password("").await,
      Err(AuthError::Encoding(_))
    ));
  }

  #[tokio::test]
  async fn test_verify_token_rejects_empty() {
    let f = fixture();
    assert!(matches!(
      f.service.verify_token("  "),
      Err(AuthError::InvalidToken)
    ));
  }

  #[tokio::test]
  async fn test_update_user_requires_admin_and_leaves_record() {
    let f = fixture();
    f.service
      .sign_up(
        email("gina@example.com"),
        password("password1"),
        BTreeSet::from(["oncology".to_string()]),
      )
      .await
      .unwrap();
    let before = f
      .repo
      .find_by_email(&email("gina@example.com"))
      .await
      .unwrap();

    let result = f
      .service
      .update_user(
        Role::Standard,
        &email("gina@example.com"),
        UserPatch {
          role: Some(Role::Admin),
          specialties: Some(BTreeSet::new()),
        },
      )
      .await;

    assert!(matches!(result, Err(AuthError::Forbidden)));
    let after = f
      .repo
      .find_by_email(&email("gina@example.com"))
      .await
      .unwrap();
    assert_eq!(before, after);
  }

  #[tokio::test]
  async fn test_update_user_by_admin() {
    let f = fixture();
    f.service
      .sign_up(
        email("hana@example.com"),
        password("password1"),
        BTreeSet::from(["oncology".to_string()]),
      )
      .await
      .unwrap();

    let updated = f
      .service
      .update_user(
        Role::Admin,
        &email("hana@example.com"),
        UserPatch {
          role: None,
          specialties: Some(BTreeSet::new()),
        },
      )
      .await
      .unwrap();
    assert!(updated.specialties.is_empty());
    assert_eq!(updated.role, Role::Standard);

    let promoted = f
      .service
      .update_user(
        Role::Admin,
        &email("hana@example.com"),
        UserPatch {
          role: Some(Role::Admin),
          specialties: None,
        },
      )
      .await
      .unwrap();
    assert_eq!(promoted.role, Role::Admin);
    assert!(promoted.specialties.is_empty());
  }

  #[tokio::test]
  async fn test_update_unknown_user() {
    let f = fixture();

    let result = f
      .service
      .update_user(Role::Admin, &email("ghost@example.com"), UserPatch::default())
      .await;

    assert!(matches!(result, Err(AuthError::UserNotFound)));
  }

  #[tokio::test]
  async fn test_list_users() {
    let f = fixture();
    for address in ["ivan@example.com", "jill@example.com"] {
      f.service
        .sign_up(email(address), password("password1"), BTreeSet::new())
        .await
        .unwrap();
    }
    make_admin(&f, "ivan@example.com").await;

    assert!(matches!(
      f.service.list_users(Role::Standard).await,
      Err(AuthError::Forbidden)
    ));

    let users = f.service.list_users(Role::Admin).await.unwrap();
    assert_eq!(users.len(), 2);

    let json = serde_json::to_value(&users).unwrap();
    for user in json.as_array().unwrap() {
      assert!(user.get("password").is_none());
      assert!(user.get("password_hash").is_none());
    }
  }
}
