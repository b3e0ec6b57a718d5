use tracing::instrument;

use crate::{
    credentials::CredentialStore,
    error::ServiceError,
    models::{LoginRequest, LoginResponse},
    repository::RepositoryState,
    token::TokenService,
};

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// LoginService
///
/// Exchanges a username/password pair for a signed token.
#[derive(Clone)]
pub struct LoginService {
    repo: RepositoryState,
    credentials: CredentialStore,
    tokens: TokenService,
}

impl LoginService {
    pub fn new(repo: RepositoryState, credentials: CredentialStore, tokens: TokenService) -> Self {
        Self {
            repo,
            credentials,
            tokens,
        }
    }

    /// Unknown usernames and wrong passwords fail identically, and no token is
    /// issued on either path.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let user = self
            .repo
            .find_user_by_username(&input.username)
            .await?
            .ok_or(ServiceError::Unauthenticated(INVALID_CREDENTIALS))?;

        let matched = self
            .credentials
            .verify_blocking(input.password, user.password_hash.clone())
            .await;
        if !matched {
            tracing::info!("login rejected");
            return Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS));
        }

        let token = self.tokens.issue(user.id, &user.username)?;
        Ok(LoginResponse {
            token,
            username: user.username,
            name: user.name,
        })
    }
}
