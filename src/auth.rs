use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{error::ServiceError, repository::RepositoryState, token::TokenService};

/// AuthUser
///
/// The acting user resolved from a bearer token. Inserted into the request
/// extensions by `resolve_identity` and read back by the `Identity` extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
}

/// Step 1 of the pipeline: the token after `Bearer `, if the header carries one.
/// Anything else (no header, another scheme) is an anonymous request.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Step 2 of the pipeline: verify the token and load the user it names.
///
/// A bad token is `InvalidToken`. A good token for a user that no longer exists
/// leaves the request anonymous (`Ok(None)`); routes decide whether that's enough.
pub async fn authenticate(
    token: &str,
    tokens: &TokenService,
    repo: &RepositoryState,
) -> Result<Option<AuthUser>, ServiceError> {
    let claims = tokens.verify(token)?;

    let user = repo.get_user(claims.id).await?;
    if user.is_none() {
        tracing::debug!(user_id = %claims.id, "token names an unknown user, continuing anonymously");
    }

    Ok(user.map(|user| AuthUser {
        id: user.id,
        username: user.username,
        name: user.name,
    }))
}

/// Runs both steps against a request's headers.
pub async fn resolve(
    headers: &HeaderMap,
    tokens: &TokenService,
    repo: &RepositoryState,
) -> Result<Option<AuthUser>, ServiceError> {
    match bearer_token(headers) {
        Some(token) => authenticate(token, tokens, repo).await,
        None => Ok(None),
    }
}

/// resolve_identity
///
/// Router-wide middleware. Attaches the acting user (if any) to the request, or
/// short-circuits with 401 when a presented token fails verification. The handler
/// never runs in that case.
pub async fn resolve_identity(
    State(tokens): State<TokenService>,
    State(repo): State<RepositoryState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve(request.headers(), &tokens, &repo).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Identity
///
/// Handler argument exposing the acting user set by `resolve_identity`.
/// Never rejects: `Identity(None)` is an anonymous request.
#[derive(Debug, Clone)]
pub struct Identity(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity(parts.extensions.get::<AuthUser>().cloned()))
    }
}
