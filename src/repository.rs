use crate::error::{RepositoryError, USERNAME_TOO_SHORT};
use crate::models::{
    Blog, BlogSummary, BlogWithOwner, NewBlogRecord, NewUserRecord, UpdateBlogRequest, User,
    UserSummary, UserWithBlogs,
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract for blogs and users. Handlers and services only see
/// `Arc<dyn Repository>`, so Postgres and the in-memory store are interchangeable.
///
/// Constraint failures (duplicate username, username too short) come back as
/// `RepositoryError::UniqueViolation` / `CheckViolation` from every implementation.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Blogs ---
    // All blogs in insertion order, each joined with its owner.
    async fn list_blogs(&self) -> RepoResult<Vec<BlogWithOwner>>;
    async fn get_blog(&self, id: Uuid) -> RepoResult<Option<Blog>>;
    async fn get_blog_with_owner(&self, id: Uuid) -> RepoResult<Option<BlogWithOwner>>;
    async fn insert_blog(&self, record: NewBlogRecord) -> RepoResult<Blog>;
    // Replaces every provided field, keeps the rest.
    async fn update_blog(&self, id: Uuid, patch: UpdateBlogRequest) -> RepoResult<Option<Blog>>;
    // Returns false if nothing was deleted.
    async fn delete_blog(&self, id: Uuid) -> RepoResult<bool>;

    // --- Users ---
    async fn insert_user(&self, record: NewUserRecord) -> RepoResult<User>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    // All users in registration order, with their blogs populated.
    async fn list_users(&self) -> RepoResult<Vec<UserWithBlogs>>;
    /// Appends `blog_id` to the user's blog list. Returns false if the user is gone.
    async fn append_user_blog(&self, user_id: Uuid, blog_id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL (see `migrations/`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape for blog queries joined with `users`.
#[derive(FromRow)]
struct BlogOwnerRow {
    id: Uuid,
    title: String,
    author: String,
    url: String,
    likes: i64,
    user_id: Option<Uuid>,
    owner_username: Option<String>,
    owner_name: Option<String>,
}

impl From<BlogOwnerRow> for BlogWithOwner {
    fn from(row: BlogOwnerRow) -> Self {
        let owner = match (row.user_id, row.owner_username) {
            (Some(id), Some(username)) => Some(UserSummary {
                id,
                username,
                name: row.owner_name,
            }),
            _ => None,
        };
        BlogWithOwner {
            blog: Blog {
                id: row.id,
                title: row.title,
                author: row.author,
                url: row.url,
                likes: row.likes,
                user_id: row.user_id,
            },
            owner,
        }
    }
}

const BLOG_WITH_OWNER_SELECT: &str = r#"
    SELECT b.id, b.title, b.author, b.url, b.likes, b.user_id,
           u.username AS owner_username, u.name AS owner_name
    FROM blogs b
    LEFT JOIN users u ON u.id = b.user_id
"#;

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_blogs(&self) -> RepoResult<Vec<BlogWithOwner>> {
        let query = format!("{} ORDER BY b.seq ASC", BLOG_WITH_OWNER_SELECT);
        let rows = sqlx::query_as::<_, BlogOwnerRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BlogWithOwner::from).collect())
    }

    async fn get_blog(&self, id: Uuid) -> RepoResult<Option<Blog>> {
        let blog = sqlx::query_as::<_, Blog>(
            "SELECT id, title, author, url, likes, user_id FROM blogs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn get_blog_with_owner(&self, id: Uuid) -> RepoResult<Option<BlogWithOwner>> {
        let query = format!("{} WHERE b.id = $1", BLOG_WITH_OWNER_SELECT);
        let row = sqlx::query_as::<_, BlogOwnerRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(BlogWithOwner::from))
    }

    async fn insert_blog(&self, record: NewBlogRecord) -> RepoResult<Blog> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (id, title, author, url, likes, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, author, url, likes, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.title)
        .bind(record.author)
        .bind(record.url)
        .bind(record.likes)
        .bind(record.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(blog)
    }

    /// COALESCE keeps the stored column whenever the patch leaves a field out.
    async fn update_blog(&self, id: Uuid, patch: UpdateBlogRequest) -> RepoResult<Option<Blog>> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            UPDATE blogs
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                url = COALESCE($4, url),
                likes = COALESCE($5, likes)
            WHERE id = $1
            RETURNING id, title, author, url, likes, user_id
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.author)
        .bind(patch.url)
        .bind(patch.likes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn delete_blog(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_user(&self, record: NewUserRecord) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, name, password_hash, blogs
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.username)
        .bind(record.name)
        .bind(record.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, name, password_hash, blogs FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, name, password_hash, blogs FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Two queries: the users, then every blog they reference in one `ANY($1)` lookup.
    async fn list_users(&self) -> RepoResult<Vec<UserWithBlogs>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, name, password_hash, blogs FROM users ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let referenced: Vec<Uuid> = users.iter().flat_map(|u| u.blogs.iter().copied()).collect();
        let summaries = sqlx::query_as::<_, BlogSummary>(
            "SELECT id, title, author, url FROM blogs WHERE id = ANY($1)",
        )
        .bind(referenced)
        .fetch_all(&self.pool)
        .await?;

        let by_id: HashMap<Uuid, BlogSummary> =
            summaries.into_iter().map(|b| (b.id, b)).collect();
        Ok(users
            .into_iter()
            .map(|user| populate_user(user, &by_id))
            .collect())
    }

    async fn append_user_blog(&self, user_id: Uuid, blog_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE users SET blogs = array_append(blogs, $2) WHERE id = $1")
            .bind(user_id)
            .bind(blog_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn populate_user(user: User, by_id: &HashMap<Uuid, BlogSummary>) -> UserWithBlogs {
    let blogs = user
        .blogs
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect();
    UserWithBlogs { user, blogs }
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct MemoryStore {
    users: Vec<User>,
    blogs: Vec<Blog>,
}

impl MemoryStore {
    fn owner_of(&self, blog: &Blog) -> Option<UserSummary> {
        let owner_id = blog.user_id?;
        self.users
            .iter()
            .find(|u| u.id == owner_id)
            .map(UserSummary::from)
    }

    fn with_owner(&self, blog: &Blog) -> BlogWithOwner {
        BlogWithOwner {
            blog: blog.clone(),
            owner: self.owner_of(blog),
        }
    }
}

/// MemoryRepository
///
/// A `Repository` held entirely in process memory. Used by the test suite and
/// by local runs without `DATABASE_URL`. It enforces the same username rules as
/// the Postgres schema, checked under the write lock.
#[derive(Default, Clone)]
pub struct MemoryRepository {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_blogs(&self) -> RepoResult<Vec<BlogWithOwner>> {
        let store = self.store.read().await;
        Ok(store.blogs.iter().map(|b| store.with_owner(b)).collect())
    }

    async fn get_blog(&self, id: Uuid) -> RepoResult<Option<Blog>> {
        let store = self.store.read().await;
        Ok(store.blogs.iter().find(|b| b.id == id).cloned())
    }

    async fn get_blog_with_owner(&self, id: Uuid) -> RepoResult<Option<BlogWithOwner>> {
        let store = self.store.read().await;
        Ok(store
            .blogs
            .iter()
            .find(|b| b.id == id)
            .map(|b| store.with_owner(b)))
    }

    async fn insert_blog(&self, record: NewBlogRecord) -> RepoResult<Blog> {
        if record.likes < 0 {
            return Err(RepositoryError::CheckViolation(
                "likes must not be negative".to_string(),
            ));
        }
        let blog = Blog {
            id: Uuid::new_v4(),
            title: record.title,
            author: record.author,
            url: record.url,
            likes: record.likes,
            user_id: record.user_id,
        };
        self.store.write().await.blogs.push(blog.clone());
        Ok(blog)
    }

    async fn update_blog(&self, id: Uuid, patch: UpdateBlogRequest) -> RepoResult<Option<Blog>> {
        if patch.likes.is_some_and(|likes| likes < 0) {
            return Err(RepositoryError::CheckViolation(
                "likes must not be negative".to_string(),
            ));
        }
        let mut store = self.store.write().await;
        let Some(blog) = store.blogs.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            blog.title = title;
        }
        if let Some(author) = patch.author {
            blog.author = author;
        }
        if let Some(url) = patch.url {
            blog.url = url;
        }
        if let Some(likes) = patch.likes {
            blog.likes = likes;
        }
        Ok(Some(blog.clone()))
    }

    async fn delete_blog(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.blogs.len();
        store.blogs.retain(|b| b.id != id);
        Ok(store.blogs.len() < before)
    }

    async fn insert_user(&self, record: NewUserRecord) -> RepoResult<User> {
        if record.username.chars().count() < 3 {
            return Err(RepositoryError::CheckViolation(
                USERNAME_TOO_SHORT.to_string(),
            ));
        }
        let mut store = self.store.write().await;
        if store.users.iter().any(|u| u.username == record.username) {
            return Err(RepositoryError::UniqueViolation(
                "users_username_key".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: record.username,
            name: record.name,
            password_hash: record.password_hash,
            blogs: Vec::new(),
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<UserWithBlogs>> {
        let store = self.store.read().await;
        let by_id: HashMap<Uuid, BlogSummary> = store
            .blogs
            .iter()
            .map(|b| {
                (
                    b.id,
                    BlogSummary {
                        id: b.id,
                        title: b.title.clone(),
                        author: b.author.clone(),
                        url: b.url.clone(),
                    },
                )
            })
            .collect();
        Ok(store
            .users
            .iter()
            .cloned()
            .map(|user| populate_user(user, &by_id))
            .collect())
    }

    async fn append_user_blog(&self, user_id: Uuid, blog_id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        match store.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.blogs.push(blog_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
