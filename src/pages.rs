use std::path::Path;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::{AppState, auth::MaybeAuthUser};

/// Pages that only make sense for anonymous visitors.
const AUTH_PAGES: [&str; 2] = ["/login", "/registrar"];
/// Pages that require a session.
const PROTECTED_PAGES: [&str; 2] = ["/post", "/perfil"];

/// GuardDecision
///
/// Outcome of the navigation guard for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// guard_decision
///
/// Logged-in visitors are sent home from the login/registration pages; anonymous
/// visitors are sent to the login page from protected pages, with the original path
/// preserved in `callbackUrl`.
pub fn guard_decision(path: &str, authenticated: bool) -> GuardDecision {
    let is_auth_page = AUTH_PAGES.iter().any(|page| path.starts_with(page));
    let is_protected = PROTECTED_PAGES.iter().any(|page| path.starts_with(page));

    if authenticated && is_auth_page {
        return GuardDecision::Redirect("/".to_string());
    }

    if !authenticated && is_protected {
        return GuardDecision::Redirect(format!(
            "/login?callbackUrl={}",
            urlencoding::encode(path)
        ));
    }

    GuardDecision::Allow
}

/// page_guard
///
/// Middleware applied to the page (non-API) fallback only.
pub async fn page_guard(
    MaybeAuthUser(user): MaybeAuthUser,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match guard_decision(&path, user.is_some()) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(target) => {
            tracing::debug!(%path, %target, "page guard redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}

/// page_routes
///
/// Serves the built client from `static_dir`. Unknown paths fall back to `index.html`
/// so client-side routes hydrate from the same shell.
pub fn page_routes(state: AppState, static_dir: &str) -> Router {
    let index = Path::new(static_dir).join("index.html");
    let client = ServeDir::new(static_dir).fallback(ServeFile::new(index));

    Router::new()
        .fallback_service(client)
        .layer(middleware::from_fn_with_state(state, page_guard))
}
