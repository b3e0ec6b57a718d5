use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid hashing parameters: {0}")]
    Params(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("hashing task failed: {0}")]
    Task(String),
}

/// CredentialStore
///
/// Hashes and verifies user passwords with salted Argon2id. The time cost is the
/// tunable work factor; everything else uses the Argon2 defaults.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    params: Params,
}

impl CredentialStore {
    pub fn new(time_cost: u32) -> Result<Self, CredentialError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            time_cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| CredentialError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Produces a PHC-format hash string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Checks `password` against a stored hash. A stored value that does not parse
    /// as a PHC string is treated as a mismatch.
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(password_hash) else {
            tracing::warn!("stored password hash could not be parsed");
            return false;
        };
        // The PHC string carries its own parameters, so verification works across cost changes.
        self.hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// `hash` on tokio's blocking pool.
    pub async fn hash_blocking(&self, password: String) -> Result<String, CredentialError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.hash(&password))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }

    /// `verify` on tokio's blocking pool. A failed task counts as a mismatch.
    pub async fn verify_blocking(&self, password: String, password_hash: String) -> bool {
        let store = self.clone();
        match tokio::task::spawn_blocking(move || store.verify(&password, &password_hash)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!("password verification task failed: {}", e);
                false
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}
