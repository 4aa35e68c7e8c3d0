use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `AuthUser` middleware, so handlers can rely on a
/// resolved identity. Post mutations additionally require the admin role, checked in
/// the handler via `AuthUser::require_admin`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        // GET /session
        // The identity the client shows in its navigation.
        .route("/session", get(handlers::get_session))
        // POST /session/refresh
        // Re-signs the token after a profile change so the navigation picks it up.
        .route("/session/refresh", post(handlers::refresh_session))
        // --- Profile ---
        // PUT /me
        // Multipart profile edit (name, email, password, avatar).
        .route("/me", put(handlers::update_profile))
        .route("/me/image", get(handlers::get_my_image))
        // --- Posts (admin only) ---
        .route("/posts", post(handlers::create_post))
        .route(
            "/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        // --- Comments ---
        // POST /posts/{id}/comments
        // Any logged-in user may comment on an existing post.
        .route("/posts/{id}/comments", post(handlers::add_comment))
        // DELETE /comments/{id}
        // Author or admin only; enforced in the handler.
        .route("/comments/{id}", delete(handlers::delete_comment))
}
