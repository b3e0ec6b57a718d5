use crate::{
    auth::Identity,
    error::{ErrorBody, ServiceError},
    extract::AppJson,
    models::{
        BlogResponse, LoginRequest, LoginResponse, NewBlogRequest, RegisterUserRequest,
        UpdateBlogRequest, UserResponse,
    },
    services::{BlogService, LoginService, UserService},
    stats::BlogStats,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Ids that do not parse can never match a stored blog, so they are reported as
/// missing rather than malformed.
fn parse_blog_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::NotFound("blog"))
}

// --- Blogs ---

/// get_blogs
///
/// Lists every blog with its owner populated (id, username, name).
#[utoipa::path(
    get,
    path = "/blogs",
    responses((status = 200, description = "All blogs", body = [BlogResponse]))
)]
pub async fn get_blogs(
    State(blogs): State<BlogService>,
) -> Result<Json<Vec<BlogResponse>>, ServiceError> {
    Ok(Json(blogs.list().await?))
}

#[utoipa::path(
    get,
    path = "/blogs/{id}",
    params(("id" = String, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Found", body = BlogResponse),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_blog(
    State(blogs): State<BlogService>,
    Path(id): Path<String>,
) -> Result<Json<BlogResponse>, ServiceError> {
    let id = parse_blog_id(&id)?;
    Ok(Json(blogs.get(id).await?))
}

/// create_blog
///
/// [Authenticated] The new blog is owned by the acting user and appended to
/// that user's blog list.
#[utoipa::path(
    post,
    path = "/blogs",
    request_body = NewBlogRequest,
    responses(
        (status = 201, description = "Created", body = BlogResponse),
        (status = 400, description = "Missing fields", body = ErrorBody),
        (status = 401, description = "No valid token", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_blog(
    Identity(user): Identity,
    State(blogs): State<BlogService>,
    payload: Result<AppJson<NewBlogRequest>, ServiceError>,
) -> Result<(StatusCode, Json<BlogResponse>), ServiceError> {
    // Anonymous callers get 401 even when the body does not parse.
    let payload = match payload {
        Ok(AppJson(payload)) => payload,
        Err(e) if user.is_some() => return Err(e),
        Err(_) => NewBlogRequest::default(),
    };
    let blog = blogs.create(payload, user.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

/// update_blog
///
/// Replaces the provided fields. Open to any caller; see `BlogService::update`.
#[utoipa::path(
    put,
    path = "/blogs/{id}",
    params(("id" = String, Path, description = "Blog ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Updated", body = BlogResponse),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_blog(
    State(blogs): State<BlogService>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateBlogRequest>,
) -> Result<Json<BlogResponse>, ServiceError> {
    let id = parse_blog_id(&id)?;
    Ok(Json(blogs.update(id, payload).await?))
}

/// delete_blog
///
/// [Authenticated, owner only]
#[utoipa::path(
    delete,
    path = "/blogs/{id}",
    params(("id" = String, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "No valid token", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_blog(
    Identity(user): Identity,
    State(blogs): State<BlogService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let id = parse_blog_id(&id)?;
    blogs.delete(id, user.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/blogs/stats",
    responses((status = 200, description = "Aggregates over all blogs", body = BlogStats))
)]
pub async fn get_blog_stats(
    State(blogs): State<BlogService>,
) -> Result<Json<BlogStats>, ServiceError> {
    let all = blogs.list().await?;
    Ok(Json(BlogStats::from_blogs(&all)))
}

// --- Users & Login ---

#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserResponse),
        (status = 400, description = "Invalid or duplicate username, short password", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(users): State<UserService>,
    AppJson(payload): AppJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ServiceError> {
    let user = users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// get_users
///
/// Lists every user with their blogs populated (id, title, author, url).
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users", body = [UserResponse]))
)]
pub async fn get_users(
    State(users): State<UserService>,
) -> Result<Json<Vec<UserResponse>>, ServiceError> {
    Ok(Json(users.list().await?))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = ErrorBody)
    )
)]
pub async fn login(
    State(login): State<LoginService>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    Ok(Json(login.login(payload).await?))
}

/// Fallback for every route the router does not know.
pub async fn unknown_endpoint() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "unknown endpoint".to_string(),
        }),
    )
}
