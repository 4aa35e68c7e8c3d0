use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles ---

/// Role
///
/// The RBAC flag carried by every user and embedded in the session token.
/// Stored as lowercase text (`'user'` / `'admin'`) in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical account row from the `users` table. The password hash never leaves
/// the server: it is skipped on serialization and stripped by [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    /// Avatar, either a data URI or an external URL.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PublicUser
///
/// Output schema for account data (registration result, admin listing).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub image: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            image: user.image,
            created_at: user.created_at,
        }
    }
}

/// Post
///
/// A row from the `posts` table. `image_url` holds the inline data URI of the cover image.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A row from the `comments` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Populated (joined) views ---

/// AuthorSummary
///
/// The subset of user fields attached to posts and comments. Posts carry
/// name/email/role/image, comments only name/image.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub image: Option<String>,
}

/// PostSummary
///
/// Minimal post reference attached to comments in the global comment listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
}

/// CommentView
///
/// A comment with its author populated (and its post, for the global listing).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author: AuthorSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostSummary>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PostView
///
/// The feed entry: a post with its author and all of its comments, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author: AuthorSummary,
    pub comments: Vec<CommentView>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Repository inputs ---

/// NewUser
///
/// Insert payload for the `users` table. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// UserUpdate
///
/// Partial profile update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub image: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.image.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
}

/// PostUpdate
///
/// Partial post update. The image is only replaced when a new one was uploaded.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for the public registration endpoints (POST /register, POST /users).
/// `role` is only honored on POST /users when the caller is an admin.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// RegisterAdminRequest
///
/// Admin self-registration, unlocked by the master key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterAdminRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

// --- Session & Profile Schemas (Output) ---

/// SessionUser
///
/// The identity the client renders in its navigation. `picture` is only set for
/// external avatar URLs; inline avatars are fetched separately via `/me/image`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub picture: Option<String>,
}

/// SessionResponse
///
/// Returned by login and session refresh. The same token is also set as the
/// `session_token` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ImageResponse {
    pub image: Option<String>,
}

/// ProfileUpdateResponse
///
/// `new_image` echoes the stored avatar when this update replaced it, so the client
/// can refresh its cached avatar without another round trip.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileUpdateResponse {
    pub success: bool,
    pub image_updated: bool,
    pub new_image: Option<String>,
}

/// SiteStats
///
/// Public counters shown on the landing page (GET /stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct SiteStats {
    pub total_posts: i64,
    pub total_users: i64,
    pub total_comments: i64,
}
