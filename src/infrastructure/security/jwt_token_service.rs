use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::auth::entities::Identity;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::TokenService;
use crate::domain::auth::value_objects::Role;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
  /// User ID
  pub sub: Uuid,
  pub role: Role,
  /// Issued at
  pub iat: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exp: Option<i64>,
}

/// HS256 session tokens signed with the process-wide secret.
///
/// Without a TTL tokens carry no `exp` claim and stay valid for as long as
/// the secret does.
pub struct JwtTokenService {
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
  validation: Validation,
  ttl_seconds: Option<i64>,
}

impl JwtTokenService {
  pub fn new(secret: &[u8], ttl_seconds: Option<i64>) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = ttl_seconds.is_some();
    validation.leeway = 0;

    Self {
      encoding_key: EncodingKey::from_secret(secret),
      decoding_key: DecodingKey::from_secret(secret),
      validation,
      ttl_seconds,
    }
  }
}

impl TokenService for JwtTokenService {
  fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
      sub: identity.user_id,
      role: identity.role,
      iat: now,
      exp: self.ttl_seconds.map(|ttl| now + ttl),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
      tracing::error!("Failed to sign session token: {}", e);
      AuthError::Encoding(e.to_string())
    })
  }

  fn verify(&self, token: &str) -> Result<Identity, AuthError> {
    let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
      tracing::debug!("Rejected session token: {}", e);
      AuthError::InvalidToken
    })?;

    Ok(Identity {
      user_id: data.claims.sub,
      role: data.claims.role,
    })
  }
}
