use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under `/admin`. Authentication comes from the extractor in each handler and
/// the role check from `AuthUser::require_admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Every account, without password hashes.
        .route("/users", get(handlers::list_users))
}
