use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// User Router Module
///
/// Registration, the user listing and login. All public.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::get_users).post(handlers::register_user))
        // POST /login exchanges username/password for a bearer token.
        .route("/login", post(handlers::login))
}
