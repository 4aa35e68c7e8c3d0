use crate::{
    AppState,
    auth::{self, AuthUser, MaybeAuthUser},
    errors::{AppError, AppResult},
    extract::{AppJson, AppMultipart, AppPath},
    forms::{PostForm, ProfileForm},
    media::{self, AVATAR_LIMIT, POST_IMAGE_LIMIT},
    models::{
        CommentView, CreateCommentRequest, ImageResponse, LoginRequest, NewPost, NewUser,
        PostUpdate, PostView, ProfileUpdateResponse, PublicUser, RegisterAdminRequest,
        RegisterUserRequest, Role, SessionResponse, SessionUser, SiteStats, User, UserUpdate,
    },
    password::{self, MIN_PASSWORD_LENGTH},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use tower_cookies::Cookies;
use uuid::Uuid;

// --- Shared helpers ---

/// Emails are compared case-insensitively by storing them lowercased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash(password: &str) -> AppResult<String> {
    password::hash_password(password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Validates the registration fields and creates the account with `role`.
async fn create_account(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> AppResult<User> {
    let name = name.trim();
    let email = normalize_email(email);
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required.".to_string(),
        ));
    }

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let user = state
        .repo
        .create_user(NewUser {
            name: name.to_string(),
            email,
            password_hash: hash(password)?,
            role,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "account created");
    Ok(user)
}

/// Signs a token for `user`, sets it as the session cookie and builds the response body.
fn start_session(state: &AppState, cookies: &Cookies, user: AuthUser) -> AppResult<SessionResponse> {
    let session_user = user.session_user();
    let token = auth::issue_token(&session_user, &state.config)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

    cookies.add(auth::session_cookie(token.clone(), &state.config));
    Ok(SessionResponse {
        token,
        user: session_user,
    })
}

// --- Accounts & Sessions ---

/// register_user
///
/// [Public Route] Ordinary sign-up. The configured superuser email is promoted to admin;
/// everyone else becomes a standard user.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = PublicUser),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let role = if normalize_email(&payload.email) == state.config.superuser_email {
        Role::Admin
    } else {
        Role::User
    };
    let user = create_account(&state, &payload.name, &payload.email, &payload.password, role).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// create_user_api
///
/// [Public Route] JSON account creation. A `role` in the body is only honored when the
/// caller is an authenticated admin; otherwise it behaves like `register_user`.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Created", body = PublicUser),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user_api(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let caller_is_admin = caller.as_ref().is_some_and(AuthUser::is_admin);
    let role = match payload.role {
        Some(requested) if caller_is_admin => requested,
        _ if normalize_email(&payload.email) == state.config.superuser_email => Role::Admin,
        _ => Role::User,
    };
    let user = create_account(&state, &payload.name, &payload.email, &payload.password, role).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// register_admin
///
/// [Public Route] Admin self-registration guarded by the master key.
#[utoipa::path(
    post,
    path = "/api/register/admin",
    request_body = RegisterAdminRequest,
    responses(
        (status = 201, description = "Admin registered", body = PublicUser),
        (status = 403, description = "Invalid master key")
    )
)]
pub async fn register_admin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterAdminRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
        || payload.secret_key.is_empty()
    {
        return Err(AppError::Validation("All fields are required.".to_string()));
    }

    // An unset key closes admin registration entirely.
    let key_matches = state
        .config
        .admin_secret_key
        .as_deref()
        .is_some_and(|key| key == payload.secret_key);
    if !key_matches {
        tracing::warn!("admin registration attempted with an invalid master key");
        return Err(AppError::Forbidden(
            "Invalid master key. Access denied.".to_string(),
        ));
    }

    let user = create_account(
        &state,
        &payload.name,
        &payload.email,
        &payload.password,
        Role::Admin,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// login
///
/// [Public Route] Credential login. Issues the session token both in the body and as
/// the `session_token` cookie.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 401, description = "Unknown user or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let email = normalize_email(&payload.email);
    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("stored hash unreadable: {e}")))?;
    if !valid {
        return Err(AppError::Unauthorized("Wrong password".to_string()));
    }

    tracing::info!(user_id = %user.id, "login succeeded");
    let session = start_session(&state, &cookies, user.into())?;
    Ok(Json(session))
}

/// logout
///
/// [Public Route] Clears the session cookie. Tokens are stateless, so a token copied
/// elsewhere stays valid until it expires.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(cookies: Cookies) -> StatusCode {
    auth::clear_session_cookie(&cookies);
    StatusCode::NO_CONTENT
}

/// get_session
///
/// [Authenticated Route] The identity behind the current session.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = SessionUser))
)]
pub async fn get_session(user: AuthUser) -> Json<SessionUser> {
    Json(user.session_user())
}

/// refresh_session
///
/// [Authenticated Route] Re-issues the token from the current database state, e.g.
/// after a profile update changed the name.
#[utoipa::path(
    post,
    path = "/api/session/refresh",
    responses((status = 200, description = "Refreshed", body = SessionResponse))
)]
pub async fn refresh_session(
    user: AuthUser,
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<SessionResponse>> {
    Ok(Json(start_session(&state, &cookies, user)?))
}

/// list_users
///
/// [Admin Route] Every account, without credentials.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users", body = [PublicUser]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PublicUser>>> {
    user.require_admin()?;
    let users = state.repo.list_users().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

// --- Profile ---

/// get_my_image
///
/// [Authenticated Route] The caller's avatar. Kept out of the session token because
/// inline avatars can be megabytes long.
#[utoipa::path(
    get,
    path = "/api/me/image",
    responses((status = 200, description = "Avatar", body = ImageResponse))
)]
pub async fn get_my_image(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ImageResponse>> {
    let image = state.repo.get_user_image(id).await?;
    Ok(Json(ImageResponse { image }))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/image",
    params(("id" = Uuid, Path, description = "User ID")),
    responses((status = 200, description = "Avatar", body = ImageResponse))
)]
pub async fn get_user_image(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ImageResponse>> {
    let image = state.repo.get_user_image(id).await?;
    Ok(Json(ImageResponse { image }))
}

/// update_profile
///
/// [Authenticated Route] Multipart profile edit. Blank fields are ignored; a request
/// that changes nothing is rejected so the client can tell the user.
#[utoipa::path(
    put,
    path = "/api/me",
    responses(
        (status = 200, description = "Updated", body = ProfileUpdateResponse),
        (status = 400, description = "Nothing to change or invalid field"),
        (status = 409, description = "Email in use"),
        (status = 413, description = "Avatar too large")
    )
)]
pub async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<Json<ProfileUpdateResponse>> {
    let form = ProfileForm::from_multipart(multipart).await?;
    let mut update = UserUpdate {
        name: form.name,
        ..UserUpdate::default()
    };

    if let Some(upload) = &form.image {
        tracing::debug!(
            user_id = %user.id,
            size = upload.bytes.len(),
            content_type = %upload.content_type,
            "avatar upload received"
        );
        update.image = media::to_data_uri(upload, AVATAR_LIMIT)?;
    }

    if let Some(password) = &form.password {
        password::validate_password_strength(password, MIN_PASSWORD_LENGTH)
            .map_err(AppError::Validation)?;
        update.password_hash = Some(hash(password)?);
    }

    if let Some(email) = form.email.as_deref().map(normalize_email) {
        if email != user.email {
            if state.repo.email_taken_by_other(&email, user.id).await? {
                return Err(AppError::Conflict(
                    "This email is already in use by another user.".to_string(),
                ));
            }
            update.email = Some(email);
        }
    }

    if update.is_empty() {
        return Err(AppError::Validation("No changes detected.".to_string()));
    }

    let image_updated = update.image.is_some();
    let updated = state
        .repo
        .update_user(user.id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    tracing::info!(user_id = %updated.id, image_updated, "profile updated");
    Ok(Json(ProfileUpdateResponse {
        success: true,
        image_updated,
        new_image: if image_updated { updated.image } else { None },
    }))
}

// --- Posts ---

/// list_posts
///
/// [Public Route] The feed: newest posts first, each with its author and comments.
#[utoipa::path(
    get,
    path = "/api/posts",
    responses((status = 200, description = "Feed", body = [PostView]))
)]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostView>>> {
    Ok(Json(state.repo.list_posts().await?))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostView),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<PostView>> {
    state
        .repo
        .get_post(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Post not found.".to_string()))
}

/// create_post
///
/// [Authenticated Route, admin only] Multipart post creation with an optional cover
/// image (stored inline as a data URI).
#[utoipa::path(
    post,
    path = "/api/posts",
    responses(
        (status = 201, description = "Created", body = crate::models::Post),
        (status = 403, description = "Not an admin"),
        (status = 413, description = "Image too large")
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<(StatusCode, Json<crate::models::Post>)> {
    user.require_admin()?;
    let form = PostForm::from_multipart(multipart).await?;

    let (Some(title), Some(content)) = (form.title, form.content) else {
        return Err(AppError::Validation(
            "Title and content are required.".to_string(),
        ));
    };

    let image_url = match &form.image {
        Some(upload) => media::to_data_uri(upload, POST_IMAGE_LIMIT)?,
        None => None,
    };

    let post = state
        .repo
        .create_post(NewPost {
            title,
            content,
            image_url,
            author_id: user.id,
        })
        .await?;

    tracing::info!(post_id = %post.id, author_id = %user.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route, admin only] Partial multipart update. The cover image is only
/// replaced when a new, non-empty file is submitted.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Updated", body = crate::models::Post),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<Json<crate::models::Post>> {
    user.require_admin()?;
    let form = PostForm::from_multipart(multipart).await?;

    let image_url = match &form.image {
        Some(upload) => media::to_data_uri(upload, POST_IMAGE_LIMIT)?,
        None => None,
    };

    let update = PostUpdate {
        title: form.title,
        content: form.content,
        image_url,
    };

    state
        .repo
        .update_post(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Post not found.".to_string()))
}

/// delete_post
///
/// [Authenticated Route, admin only] Removes a post together with its comments.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    if state.repo.delete_post(id).await? {
        tracing::info!(post_id = %id, "post deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Post not found.".to_string()))
    }
}

// --- Comments ---

/// list_all_comments
///
/// [Public Route] Every comment with its author and post.
#[utoipa::path(
    get,
    path = "/api/comments",
    responses((status = 200, description = "Comments", body = [CommentView]))
)]
pub async fn list_all_comments(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(state.repo.list_all_comments().await?))
}

/// list_comments
///
/// [Public Route] Comments of one post, newest first.
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses((status = 200, description = "Comments", body = [CommentView]))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(post_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(state.repo.list_comments(post_id).await?))
}

/// add_comment
///
/// [Authenticated Route] Any logged-in user may comment on an existing post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = crate::models::Comment),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn add_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    AppPath(post_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<crate::models::Comment>)> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("The comment cannot be empty.".to_string()));
    }

    let comment = state
        .repo
        .create_comment(post_id, user_id, content.to_string())
        .await
        .map_err(|e| match e {
            crate::repository::RepositoryError::NotFound => {
                AppError::NotFound("Post not found.".to_string())
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// delete_comment
///
/// [Authenticated Route] The comment's author or an admin may delete it.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let comment = state
        .repo
        .get_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found.".to_string()))?;

    if comment.author_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only the author or an administrator can delete this comment.".to_string(),
        ));
    }

    if state.repo.delete_comment(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Comment not found.".to_string()))
    }
}

// --- Stats ---

/// get_site_stats
///
/// [Public Route] Post, user and comment counters for the landing page.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses((status = 200, description = "Stats", body = SiteStats))
)]
pub async fn get_site_stats(State(state): State<AppState>) -> AppResult<Json<SiteStats>> {
    Ok(Json(state.repo.count_stats().await?))
}
