use tracing::instrument;

use crate::{
    credentials::CredentialStore,
    error::ServiceError,
    models::{NewUserRecord, RegisterUserRequest, UserResponse, UserWithBlogs},
    repository::RepositoryState,
};

pub const MIN_PASSWORD_LENGTH: usize = 3;

/// UserService
///
/// Registration and listing. The password length rule is checked here; the
/// username rules (length, uniqueness) are enforced by the repository and
/// reclassified through `From<RepositoryError>`.
#[derive(Clone)]
pub struct UserService {
    repo: RepositoryState,
    credentials: CredentialStore,
}

impl UserService {
    pub fn new(repo: RepositoryState, credentials: CredentialStore) -> Self {
        Self { repo, credentials }
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterUserRequest) -> Result<UserResponse, ServiceError> {
        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash = self
            .credentials
            .hash_blocking(input.password)
            .await
            .map_err(|e| ServiceError::Unhandled(e.to_string()))?;

        let user = self
            .repo
            .insert_user(NewUserRecord {
                username: input.username,
                name: input.name,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(UserResponse::from(UserWithBlogs {
            user,
            blogs: Vec::new(),
        }))
    }

    /// Every user with their blogs populated (id, title, author, url).
    pub async fn list(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self.repo.list_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
