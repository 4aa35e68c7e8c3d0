use axum::body::Bytes;
use base64::{Engine, engine::general_purpose::STANDARD};

/// Maximum size of a post cover image.
pub const POST_IMAGE_LIMIT: usize = 10 * 1024 * 1024;
/// Maximum size of a profile avatar.
pub const AVATAR_LIMIT: usize = 2 * 1024 * 1024;

/// MediaError
///
/// Rejections produced while turning an uploaded file into its stored form.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MediaError {
    #[error("The image must be at most {}MB.", .limit / (1024 * 1024))]
    TooLarge { limit: usize },

    #[error("Unsupported file type '{0}': only images are accepted.")]
    UnsupportedType(String),
}

/// ImageUpload
///
/// A file field read from a multipart form, before validation.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Browsers submit an empty part when the file input was left blank.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// to_data_uri
///
/// Encodes an upload as `data:<mime>;base64,<payload>`, the form every image is
/// persisted in. An empty upload yields `Ok(None)` ("no new image").
pub fn to_data_uri(upload: &ImageUpload, limit: usize) -> Result<Option<String>, MediaError> {
    if upload.is_empty() {
        return Ok(None);
    }

    if upload.bytes.len() > limit {
        return Err(MediaError::TooLarge { limit });
    }

    let mime = upload.content_type.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") {
        return Err(MediaError::UnsupportedType(mime));
    }

    Ok(Some(format!(
        "data:{};base64,{}",
        mime,
        STANDARD.encode(&upload.bytes)
    )))
}

/// True when the image is stored inline rather than referenced by URL.
/// Inline images are too large to travel inside the session token.
pub fn is_data_uri(image: &str) -> bool {
    image.starts_with("data:")
}

/// Returns the image only if it can be referenced by URL.
pub fn external_picture(image: Option<&str>) -> Option<String> {
    image
        .filter(|img| !img.is_empty() && !is_data_uri(img))
        .map(str::to_string)
}
