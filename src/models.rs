use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Stored Entities ---

/// User
///
/// The stored user record from the `users` table. Holds the password hash, so it
/// is never serialized outward; handlers convert it into `UserResponse`.
#[derive(Debug, Clone, FromRow, Default, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub password_hash: String,
    // Ids of the blogs this user created, in creation order.
    pub blogs: Vec<Uuid>,
}

/// Blog
///
/// A stored blog row. `user_id` is `None` only for legacy records created before
/// ownership was tracked.
#[derive(Debug, Clone, FromRow, Default, PartialEq)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: i64,
    pub user_id: Option<Uuid>,
}

/// A blog joined with its owner, as returned by the listing and delete lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogWithOwner {
    pub blog: Blog,
    pub owner: Option<UserSummary>,
}

/// A user joined with the blogs it references. Dangling references are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithBlogs {
    pub user: User,
    pub blogs: Vec<BlogSummary>,
}

/// Insert payload handed to the repository once the service has validated input.
#[derive(Debug, Clone)]
pub struct NewBlogRecord {
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: i64,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub name: Option<String>,
    pub password_hash: String,
}

// --- Populated References ---

/// UserSummary
///
/// The owner projection embedded in blog listings: id, username and name only.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
}

/// BlogSummary
///
/// The blog projection embedded in user listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, FromRow)]
#[ts(export)]
pub struct BlogSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub url: String,
}

/// BlogOwner
///
/// The `user` field of a blog on the wire: a bare id, or the populated owner
/// when the blog came from the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(untagged)]
#[ts(export)]
pub enum BlogOwner {
    Populated(UserSummary),
    Id(Uuid),
}

// --- Response Schemas ---

/// BlogResponse
///
/// Wire representation of a blog. Exposes `id` and nothing storage-internal.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub user: Option<BlogOwner>,
}

impl From<Blog> for BlogResponse {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            author: blog.author,
            url: blog.url,
            likes: blog.likes,
            user: blog.user_id.map(BlogOwner::Id),
        }
    }
}

impl From<BlogWithOwner> for BlogResponse {
    fn from(joined: BlogWithOwner) -> Self {
        let owner = joined.owner.map(BlogOwner::Populated);
        let mut response = BlogResponse::from(joined.blog);
        // A reference to a user that no longer resolves stays a bare id.
        if owner.is_some() {
            response.user = owner;
        }
        response
    }
}

/// UserResponse
///
/// Wire representation of a user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub blogs: Vec<BlogSummary>,
}

impl From<UserWithBlogs> for UserResponse {
    fn from(joined: UserWithBlogs) -> Self {
        Self {
            id: joined.user.id,
            username: joined.user.username,
            name: joined.user.name,
            blogs: joined.blogs,
        }
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

// --- Request Payloads ---

/// NewBlogRequest
///
/// Input for POST /blogs. Every field is optional at the serde level so the
/// service can report all missing fields at once instead of failing on the first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewBlogRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub likes: Option<i64>,
}

/// UpdateBlogRequest
///
/// Input for PUT /blogs/{id}. Provided fields replace the stored value, absent
/// fields are left as they are.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateBlogRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
}

/// RegisterUserRequest
///
/// Input for POST /users. Missing strings deserialize as empty so that the
/// length rules produce the error instead of a JSON rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// LoginResponse
///
/// Returned by POST /login. `token` is presented later as `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: Option<String>,
}
