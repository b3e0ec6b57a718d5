use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

/// Claims
///
/// The payload signed into every login token: the user's id and username.
/// There is no `exp` claim: a token stays valid as long as the
/// signing secret does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub username: String,
    pub id: Uuid,
}

/// TokenService
///
/// Issues and verifies HS256 tokens. The keys are derived once from the secret
/// passed in at startup and shared (cheaply cloned) across requests.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens are time-unbound: no exp to require or check.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, ServiceError> {
        let claims = Claims {
            username: username.to_string(),
            id: user_id,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Unhandled(format!("token signing failed: {}", e)))
    }

    /// Checks signature and structure. Any failure is `InvalidToken`; the reason
    /// is only logged.
    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token rejected: {:?}", e.kind());
                ServiceError::InvalidToken
            })
    }
}
