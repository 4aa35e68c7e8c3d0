use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    errors::AppError,
    media,
    models::{Role, SessionUser, User},
    repository::RepositoryState,
};

/// Name of the cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "session_token";

/// Claims
///
/// The payload of a session token. Everything the navigation needs to render is carried
/// here so a page can hydrate without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Avatar URL. Never a data URI: inline avatars would bloat every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued At (iat).
    pub iat: usize,
    /// Expiration Time (exp).
    pub exp: usize,
}

impl Claims {
    pub fn for_session(user: &SessionUser, ttl_hours: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            picture: user.picture.clone(),
            iat: now as usize,
            exp: (now + ttl_hours * 3600) as usize,
        }
    }
}

/// issue_token
///
/// Signs an HS256 session token for `user` with the configured lifetime.
pub fn issue_token(
    user: &SessionUser,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::for_session(user, config.session_ttl_hours);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// decode_token
///
/// Validates signature and expiry and returns the embedded claims.
pub fn decode_token(token: &str, config: &AppConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// session_cookie
///
/// The HttpOnly cookie set at login. `Secure` is only required in production so the
/// local dev server keeps working over plain HTTP.
pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_production())
        .max_age(Duration::hours(config.session_ttl_hours))
        .build()
}

pub fn clear_session_cookie(cookies: &Cookies) {
    cookies.remove(Cookie::build(SESSION_COOKIE).path("/").build());
}

/// AuthUser
///
/// The resolved identity of an authenticated request, re-read from the database on
/// every request so role changes and deleted accounts take effect immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// External avatar URL, if any (see [`Claims::picture`]).
    pub picture: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Rejects non-admins with 403.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Access denied: only administrators can do this.".to_string(),
            ))
        }
    }

    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            picture: self.picture.clone(),
        }
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            picture: media::external_picture(user.image.as_deref()),
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Pulls the raw token from `Authorization: Bearer ...`, falling back to the session cookie.
fn extract_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw.to_string()))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// AuthUser Extractor Implementation
///
/// 1. Local bypass: in `Env::Local` the `x-user-id` header resolves a known user directly.
/// 2. Token extraction: Bearer header or `session_token` cookie.
/// 3. Token validation: signature + expiry.
/// 4. DB lookup: the account must still exist.
///
/// Rejection: 401 on any failure, 500 if the repository itself fails.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.find_user_by_id(user_id).await? {
                    return Ok(user.into());
                }
            }
        }

        let token = extract_token(parts)
            .ok_or_else(|| AppError::Unauthorized("You need to be logged in.".to_string()))?;

        let claims = decode_token(&token, &config).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            AppError::Unauthorized("Invalid or expired session.".to_string())
        })?;

        let user = repo
            .find_user_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists.".to_string()))?;

        Ok(user.into())
    }
}

/// MaybeAuthUser
///
/// Like [`AuthUser`] but never rejects: anonymous (or invalid) sessions yield `None`.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
