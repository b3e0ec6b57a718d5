use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Blog Router Module
///
/// Reads are open to anonymous callers. Creation and deletion need an acting
/// user (resolved from the bearer token) and deletion additionally needs
/// ownership; both checks live in `BlogService`. Updates are unrestricted.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        // GET /blogs lists everything with owners populated.
        // POST /blogs creates a blog owned by the acting user.
        .route("/blogs", get(handlers::get_blogs).post(handlers::create_blog))
        // Static segment, matched ahead of /blogs/{id}.
        .route("/blogs/stats", get(handlers::get_blog_stats))
        .route(
            "/blogs/{id}",
            get(handlers::get_blog)
                .put(handlers::update_blog)
                .delete(handlers::delete_blog),
        )
}
