use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. Reads of posts, comments and avatars are
/// public because the feed renders for anonymous visitors too.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Accounts ---
        .route("/register", post(handlers::register_user))
        // POST /register/admin
        // Admin sign-up. Rejected unless the body carries the configured master key.
        .route("/register/admin", post(handlers::register_admin))
        // POST /users
        // JSON account creation; an admin caller may pick the role.
        .route("/users", post(handlers::create_user_api))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        // GET /users/{id}/image
        // Avatars are served separately because inline images are too large for the token.
        .route("/users/{id}/image", get(handlers::get_user_image))
        // --- Feed ---
        // GET /posts
        // Newest first, each post with its author and comments.
        .route("/posts", get(handlers::list_posts))
        .route("/posts/{id}", get(handlers::get_post))
        .route("/posts/{id}/comments", get(handlers::list_comments))
        .route("/comments", get(handlers::list_all_comments))
        // GET /stats
        // Landing page counters.
        .route("/stats", get(handlers::get_site_stats))
}
