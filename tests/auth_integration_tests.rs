mod common;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use bloglist::{
    ServiceError, TokenService,
    auth::{self, AuthUser},
    error::RepositoryError,
    models::{
        Blog, BlogWithOwner, NewBlogRecord, NewUserRecord, UpdateBlogRequest, User, UserWithBlogs,
    },
    repository::{RepoResult, Repository, RepositoryState},
};
use common::{register_and_login, send, test_app};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use std::{collections::HashSet, sync::Arc};
use uuid::Uuid;

const SECRET: &str = "test-secret";

// --- Mock Repository for Auth Logic ---

#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn get_user(&self, _id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.user_to_return.clone())
    }
    // The identity resolver only ever loads users by id.
    async fn list_blogs(&self) -> RepoResult<Vec<BlogWithOwner>> {
        Ok(vec![])
    }
    async fn get_blog(&self, _id: Uuid) -> RepoResult<Option<Blog>> {
        Ok(None)
    }
    async fn get_blog_with_owner(&self, _id: Uuid) -> RepoResult<Option<BlogWithOwner>> {
        Ok(None)
    }
    async fn insert_blog(&self, _record: NewBlogRecord) -> RepoResult<Blog> {
        Err(RepositoryError::Database("not supported".into()))
    }
    async fn update_blog(&self, _id: Uuid, _patch: UpdateBlogRequest) -> RepoResult<Option<Blog>> {
        Ok(None)
    }
    async fn delete_blog(&self, _id: Uuid) -> RepoResult<bool> {
        Ok(false)
    }
    async fn insert_user(&self, _record: NewUserRecord) -> RepoResult<User> {
        Err(RepositoryError::Database("not supported".into()))
    }
    async fn find_user_by_username(&self, _username: &str) -> RepoResult<Option<User>> {
        Ok(None)
    }
    async fn list_users(&self) -> RepoResult<Vec<UserWithBlogs>> {
        Ok(vec![])
    }
    async fn append_user_blog(&self, _user_id: Uuid, _blog_id: Uuid) -> RepoResult<bool> {
        Ok(false)
    }
}

fn mock_user() -> User {
    User {
        id: Uuid::new_v4(),
        username: "mluukkai".to_string(),
        name: Some("Matti Luukkainen".to_string()),
        password_hash: "irrelevant".to_string(),
        blogs: vec![],
    }
}

fn repo_with(user: Option<User>) -> RepositoryState {
    Arc::new(MockAuthRepo {
        user_to_return: user,
    })
}

fn bearer(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

// --- TokenService ---

#[test]
fn issued_token_verifies_to_the_same_claims() {
    let tokens = TokenService::new(SECRET);
    let id = Uuid::new_v4();

    let token = tokens.issue(id, "mluukkai").unwrap();
    let claims = tokens.verify(&token).unwrap();

    assert_eq!(claims.id, id);
    assert_eq!(claims.username, "mluukkai");
}

#[test]
fn token_signed_with_another_secret_is_invalid() {
    let token = TokenService::new("other-secret")
        .issue(Uuid::new_v4(), "mluukkai")
        .unwrap();

    let result = TokenService::new(SECRET).verify(&token);
    assert_eq!(result, Err(ServiceError::InvalidToken));
}

#[test]
fn tampered_token_is_invalid() {
    let tokens = TokenService::new(SECRET);
    let token = tokens.issue(Uuid::new_v4(), "mluukkai").unwrap();

    // Swap the payload for one from a different user, keeping the signature.
    let other = tokens.issue(Uuid::new_v4(), "hellas").unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    parts[1] = other_parts[1];
    let forged = parts.join(".");

    assert_eq!(tokens.verify(&forged), Err(ServiceError::InvalidToken));
    assert_eq!(tokens.verify("garbage"), Err(ServiceError::InvalidToken));
}

#[test]
fn tokens_carry_no_expiry() {
    let token = TokenService::new(SECRET)
        .issue(Uuid::new_v4(), "mluukkai")
        .unwrap();

    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    let payload = decode::<serde_json::Value>(
        &token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims;

    assert!(payload.get("exp").is_none());
    assert_eq!(payload["username"], "mluukkai");
    assert!(payload["id"].is_string());
}

// --- Header Parsing ---

#[test]
fn bearer_token_requires_the_bearer_scheme() {
    assert_eq!(auth::bearer_token(&bearer("Bearer abc.def")), Some("abc.def"));
    assert_eq!(auth::bearer_token(&bearer("Basic abc")), None);
    assert_eq!(auth::bearer_token(&bearer("bearer abc")), None);
    assert_eq!(auth::bearer_token(&HeaderMap::new()), None);
}

// --- Identity Resolution ---

#[tokio::test]
async fn valid_token_resolves_the_stored_user() {
    let tokens = TokenService::new(SECRET);
    let user = mock_user();
    let token = tokens.issue(user.id, &user.username).unwrap();
    let repo = repo_with(Some(user.clone()));

    let resolved = auth::resolve(&bearer(&format!("Bearer {}", token)), &tokens, &repo)
        .await
        .unwrap();

    assert_eq!(
        resolved,
        Some(AuthUser {
            id: user.id,
            username: user.username,
            name: user.name,
        })
    );
}

#[tokio::test]
async fn missing_header_resolves_anonymously() {
    let tokens = TokenService::new(SECRET);
    let repo = repo_with(Some(mock_user()));

    let resolved = auth::resolve(&HeaderMap::new(), &tokens, &repo).await;
    assert_eq!(resolved, Ok(None));
}

#[tokio::test]
async fn token_for_unknown_user_resolves_anonymously() {
    let tokens = TokenService::new(SECRET);
    let token = tokens.issue(Uuid::new_v4(), "ghost").unwrap();
    let repo = repo_with(None);

    let resolved = auth::authenticate(&token, &tokens, &repo).await;
    assert_eq!(resolved, Ok(None));
}

#[tokio::test]
async fn bad_token_fails_resolution() {
    let tokens = TokenService::new(SECRET);
    let repo = repo_with(Some(mock_user()));

    let resolved = auth::resolve(&bearer("Bearer nope"), &tokens, &repo).await;
    assert_eq!(resolved, Err(ServiceError::InvalidToken));
}

// --- Middleware ---

#[tokio::test]
async fn middleware_rejects_a_bad_token_before_the_handler() {
    let app = test_app();
    let res = send(&app, Method::GET, "/users", Some("x.y.z"), None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "token invalid");
}

#[tokio::test]
async fn token_from_another_deployment_is_rejected() {
    let app = test_app();
    let foreign = TokenService::new("someone-elses-secret")
        .issue(Uuid::new_v4(), "mluukkai")
        .unwrap();

    let res = send(&app, Method::GET, "/blogs", Some(&foreign), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_of_a_user_from_an_empty_store_counts_as_no_token() {
    let app = test_app();
    // Signed with the app's own secret but naming nobody it knows.
    let config = common::test_config();
    let orphan = TokenService::new(&config.secret)
        .issue(Uuid::new_v4(), "ghost")
        .unwrap();

    let read = send(&app, Method::GET, "/blogs", Some(&orphan), None).await;
    assert_eq!(read.status, StatusCode::OK);

    let write = send(
        &app,
        Method::POST,
        "/blogs",
        Some(&orphan),
        Some(serde_json::json!({ "title": "T", "author": "A", "url": "http://a" })),
    )
    .await;
    assert_eq!(write.status, StatusCode::UNAUTHORIZED);
    assert_eq!(write.body["error"], "token missing or invalid");
}

#[tokio::test]
async fn login_token_is_accepted_by_the_middleware() {
    let app = test_app();
    let token = register_and_login(&app, "mluukkai").await;

    let res = send(&app, Method::GET, "/blogs", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
}
