use crate::models::{
    AuthorSummary, Comment, CommentView, NewPost, NewUser, Post, PostSummary, PostUpdate,
    PostView, Role, SiteStats, User, UserUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// RepositoryError
///
/// Failures surfaced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness rule was violated (e.g. a duplicate email).
    #[error("{0}")]
    Conflict(String),

    /// The referenced row does not exist.
    #[error("Resource not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so handlers talk
/// to the data layer without knowing whether it is Postgres or the in-memory store.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
    // Emails are stored lowercased; callers normalize before lookup.
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // True when another account (not `user_id`) already owns `email`.
    async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> RepoResult<bool>;
    // Fails with `Conflict` on a duplicate email.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    // Returns `None` when the user no longer exists.
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> RepoResult<Option<User>>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    // Only the avatar column, so the navigation can load it without the full row.
    async fn get_user_image(&self, id: Uuid) -> RepoResult<Option<String>>;

    // --- Posts ---
    // Newest first, author and comments populated.
    async fn list_posts(&self) -> RepoResult<Vec<PostView>>;
    async fn get_post(&self, id: Uuid) -> RepoResult<Option<PostView>>;
    async fn create_post(&self, post: NewPost) -> RepoResult<Post>;
    async fn update_post(&self, id: Uuid, update: PostUpdate) -> RepoResult<Option<Post>>;
    // Comments on the post are removed with it.
    async fn delete_post(&self, id: Uuid) -> RepoResult<bool>;

    // --- Comments ---
    // Every comment with author and post populated.
    async fn list_all_comments(&self) -> RepoResult<Vec<CommentView>>;
    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<CommentView>>;
    async fn create_comment(&self, post_id: Uuid, author_id: Uuid, content: String)
    -> RepoResult<Comment>;
    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool>;

    // --- Stats ---
    async fn count_stats(&self) -> RepoResult<SiteStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres implementation ---

const USER_COLUMNS: &str = "id, name, email, password_hash, role, image, created_at, updated_at";
const POST_COLUMNS: &str = "id, title, content, image_url, author_id, created_at, updated_at";

/// PostRow
///
/// A post joined with its author's public fields.
#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    image_url: Option<String>,
    author_id: Uuid,
    author_name: String,
    author_email: String,
    #[sqlx(try_from = "String")]
    author_role: Role,
    author_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_view(self, comments: Vec<CommentView>) -> PostView {
        PostView {
            id: self.id,
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            author: AuthorSummary {
                id: self.author_id,
                name: self.author_name,
                email: Some(self.author_email),
                role: Some(self.author_role),
                image: self.author_image,
            },
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// CommentRow
///
/// A comment joined with its author's name/avatar and its post's title.
#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    content: String,
    post_id: Uuid,
    post_title: String,
    author_id: Uuid,
    author_name: String,
    author_image: Option<String>,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_view(self, with_post: bool) -> CommentView {
        CommentView {
            id: self.id,
            content: self.content,
            post_id: self.post_id,
            author: AuthorSummary {
                id: self.author_id,
                name: self.author_name,
                email: None,
                role: None,
                image: self.author_image,
            },
            post: with_post.then(|| PostSummary {
                id: self.post_id,
                title: self.post_title,
            }),
            created_at: self.created_at,
        }
    }
}

const POST_VIEW_QUERY: &str = r#"
    SELECT p.id, p.title, p.content, p.image_url, p.author_id,
           u.name AS author_name, u.email AS author_email,
           u.role AS author_role, u.image AS author_image,
           p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const COMMENT_VIEW_QUERY: &str = r#"
    SELECT c.id, c.content, c.post_id, p.title AS post_title,
           c.author_id, u.name AS author_name, u.image AS author_image,
           c.created_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
    JOIN posts p ON p.id = c.post_id
"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the comments of the given posts in one round trip and groups them per post.
    async fn comments_by_post(&self, post_ids: &[Uuid]) -> RepoResult<HashMap<Uuid, Vec<CommentView>>> {
        let query = format!(
            "{COMMENT_VIEW_QUERY} WHERE c.post_id = ANY($1) ORDER BY c.created_at DESC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(post_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.post_id)
                .or_default()
                .push(row.into_view(false));
        }
        Ok(grouped)
    }
}

/// Maps a Postgres unique violation (SQLSTATE 23505) to `Conflict`.
fn map_unique_violation(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return RepositoryError::Conflict(message.to_string());
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> RepoResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// create_user
    ///
    /// The unique index on `users.email` is the final arbiter of duplicate registrations.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let query = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Email already registered"))
    }

    /// update_user
    ///
    /// Uses `COALESCE` so only the `Some` fields of the update are written.
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> RepoResult<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                image = COALESCE($5, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(update.name)
            .bind(update.email)
            .bind(update.password_hash)
            .bind(update.image)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "This email is already in use by another user."))
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        Ok(sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_user_image(&self, id: Uuid) -> RepoResult<Option<String>> {
        let image: Option<Option<String>> =
            sqlx::query_scalar("SELECT image FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(image.flatten())
    }

    /// list_posts
    ///
    /// Two queries regardless of the number of posts: one for the posts with their
    /// authors, one for all of their comments.
    async fn list_posts(&self) -> RepoResult<Vec<PostView>> {
        let query = format!("{POST_VIEW_QUERY} ORDER BY p.created_at DESC");
        let rows = sqlx::query_as::<_, PostRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut comments = self.comments_by_post(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let post_comments = comments.remove(&row.id).unwrap_or_default();
                row.into_view(post_comments)
            })
            .collect())
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<PostView>> {
        let query = format!("{POST_VIEW_QUERY} WHERE p.id = $1");
        let Some(row) = sqlx::query_as::<_, PostRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let comments = self.list_comments(id).await?;
        Ok(Some(row.into_view(comments)))
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let query = format!(
            "INSERT INTO posts (id, title, content, image_url, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(Uuid::new_v4())
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.image_url)
            .bind(post.author_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_post(&self, id: Uuid, update: PostUpdate) -> RepoResult<Option<Post>> {
        let query = format!(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(update.title)
            .bind(update.content)
            .bind(update.image_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// delete_post
    ///
    /// `comments.post_id` is declared `ON DELETE CASCADE`, so orphaned comments cannot remain.
    async fn delete_post(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all_comments(&self) -> RepoResult<Vec<CommentView>> {
        let query = format!("{COMMENT_VIEW_QUERY} ORDER BY c.created_at DESC");
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.into_view(true)).collect())
    }

    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<CommentView>> {
        let query = format!("{COMMENT_VIEW_QUERY} WHERE c.post_id = $1 ORDER BY c.created_at DESC");
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.into_view(false)).collect())
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, content, author_id, post_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             RETURNING id, content, author_id, post_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(author_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // FK violation: the post does not exist (or was deleted mid-request).
            let missing_post = matches!(
                &e,
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503")
            );
            if missing_post {
                RepositoryError::NotFound
            } else {
                RepositoryError::Database(e)
            }
        })
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT id, content, author_id, post_id, created_at, updated_at \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_stats(&self) -> RepoResult<SiteStats> {
        let (total_posts, total_users, total_comments): (i64, i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM posts), (SELECT COUNT(*) FROM users), (SELECT COUNT(*) FROM comments)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SiteStats {
            total_posts,
            total_users,
            total_comments,
        })
    }
}

// --- In-memory implementation ---

#[derive(Default)]
struct MemoryStore {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl MemoryStore {
    fn author_of_post(&self, author_id: Uuid) -> AuthorSummary {
        self.users
            .iter()
            .find(|u| u.id == author_id)
            .map(|u| AuthorSummary {
                id: u.id,
                name: u.name.clone(),
                email: Some(u.email.clone()),
                role: Some(u.role),
                image: u.image.clone(),
            })
            .unwrap_or_else(|| AuthorSummary {
                id: author_id,
                ..AuthorSummary::default()
            })
    }

    fn comment_view(&self, comment: &Comment, with_post: bool) -> CommentView {
        let author = self.users.iter().find(|u| u.id == comment.author_id);
        CommentView {
            id: comment.id,
            content: comment.content.clone(),
            post_id: comment.post_id,
            author: AuthorSummary {
                id: comment.author_id,
                name: author.map(|u| u.name.clone()).unwrap_or_default(),
                email: None,
                role: None,
                image: author.and_then(|u| u.image.clone()),
            },
            post: with_post
                .then(|| self.posts.iter().find(|p| p.id == comment.post_id))
                .flatten()
                .map(|p| PostSummary {
                    id: p.id,
                    title: p.title.clone(),
                }),
            created_at: comment.created_at,
        }
    }

    fn comments_for(&self, post_id: Uuid, with_post: bool) -> Vec<CommentView> {
        let mut comments: Vec<&Comment> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        newest_first(&mut comments, |c| c.created_at);
        comments
            .into_iter()
            .map(|c| self.comment_view(c, with_post))
            .collect()
    }

    fn post_view(&self, post: &Post) -> PostView {
        PostView {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            author: self.author_of_post(post.author_id),
            comments: self.comments_for(post.id, false),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Sorts newest first. Ties keep insertion order reversed, so the latest insert wins.
fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.reverse();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

/// InMemoryRepository
///
/// A process-local implementation of `Repository` used by the router tests, the
/// spawned-server smoke tests and the `STORAGE_BACKEND=memory` local demo mode. Enforces the same rules as the Postgres schema:
/// unique emails, comments referencing existing posts, cascade on post delete.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<MemoryStore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> RepoResult<bool> {
        let store = self.store.read().await;
        Ok(store
            .users
            .iter()
            .any(|u| u.email == email && u.id != user_id))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut store = self.store.write().await;
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(
                "Email already registered".to_string(),
            ));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            image: None,
            created_at: now,
            updated_at: now,
        };
        store.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> RepoResult<Option<User>> {
        let mut store = self.store.write().await;
        if let Some(email) = &update.email {
            if store.users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(RepositoryError::Conflict(
                    "This email is already in use by another user.".to_string(),
                ));
            }
        }
        let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        if let Some(image) = update.image {
            user.image = Some(image);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.store.read().await.users.clone())
    }

    async fn get_user_image(&self, id: Uuid) -> RepoResult<Option<String>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .iter()
            .find(|u| u.id == id)
            .and_then(|u| u.image.clone()))
    }

    async fn list_posts(&self) -> RepoResult<Vec<PostView>> {
        let store = self.store.read().await;
        let mut posts: Vec<&Post> = store.posts.iter().collect();
        newest_first(&mut posts, |p| p.created_at);
        Ok(posts.into_iter().map(|p| store.post_view(p)).collect())
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<PostView>> {
        let store = self.store.read().await;
        Ok(store
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| store.post_view(p)))
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let mut store = self.store.write().await;
        if !store.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepositoryError::NotFound);
        }
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            author_id: post.author_id,
            created_at: now,
            updated_at: now,
        };
        store.posts.push(created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: Uuid, update: PostUpdate) -> RepoResult<Option<Post>> {
        let mut store = self.store.write().await;
        let Some(post) = store.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(content) = update.content {
            post.content = content;
        }
        if let Some(image_url) = update.image_url {
            post.image_url = Some(image_url);
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.posts.len();
        store.posts.retain(|p| p.id != id);
        let deleted = store.posts.len() < before;
        if deleted {
            store.comments.retain(|c| c.post_id != id);
        }
        Ok(deleted)
    }

    async fn list_all_comments(&self) -> RepoResult<Vec<CommentView>> {
        let store = self.store.read().await;
        let mut comments: Vec<&Comment> = store.comments.iter().collect();
        newest_first(&mut comments, |c| c.created_at);
        Ok(comments
            .into_iter()
            .map(|c| store.comment_view(c, true))
            .collect())
    }

    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<CommentView>> {
        let store = self.store.read().await;
        Ok(store.comments_for(post_id, false))
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> RepoResult<Comment> {
        let mut store = self.store.write().await;
        if !store.posts.iter().any(|p| p.id == post_id) {
            return Err(RepositoryError::NotFound);
        }
        let now = Utc::now();
        let created = Comment {
            id: Uuid::new_v4(),
            content,
            author_id,
            post_id,
            created_at: now,
            updated_at: now,
        };
        store.comments.push(created.clone());
        Ok(created)
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        let store = self.store.read().await;
        Ok(store.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.comments.len();
        store.comments.retain(|c| c.id != id);
        Ok(store.comments.len() < before)
    }

    async fn count_stats(&self) -> RepoResult<SiteStats> {
        let store = self.store.read().await;
        Ok(SiteStats {
            total_posts: store.posts.len() as i64,
            total_users: store.users.len() as i64,
            total_comments: store.comments.len() as i64,
        })
    }
}
