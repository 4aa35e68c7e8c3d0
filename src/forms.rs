use axum::extract::{Multipart, multipart::Field};

use crate::{errors::AppError, media::ImageUpload};

/// PostForm
///
/// Multipart body of the post editor (create and update share the same fields).
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<ImageUpload>,
}

/// ProfileForm
///
/// Multipart body of the profile page. Every field is optional; blank fields are ignored.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<ImageUpload>,
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = PostForm::default();
        while let Some(field) = next_field(&mut multipart).await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => form.title = non_blank(read_text(field).await?),
                "content" => form.content = non_blank(read_text(field).await?),
                "image" => form.image = Some(read_file(field).await?),
                // Unknown parts (e.g. a legacy `id` field) are drained and ignored.
                _ => drain(field).await?,
            }
        }
        Ok(form)
    }
}

impl ProfileForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ProfileForm::default();
        while let Some(field) = next_field(&mut multipart).await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "name" => form.name = non_blank(read_text(field).await?),
                "email" => form.email = non_blank(read_text(field).await?),
                // Passwords are not trimmed: whitespace is a valid character.
                "password" => {
                    let password = read_text(field).await?;
                    form.password = (!password.trim().is_empty()).then_some(password);
                }
                "image" => form.image = Some(read_file(field).await?),
                _ => drain(field).await?,
            }
        }
        Ok(form)
    }
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form field: {e}")))
}

async fn drain(field: Field<'_>) -> Result<(), AppError> {
    field
        .bytes()
        .await
        .map(|_| ())
        .map_err(|e| AppError::Validation(format!("Invalid form field: {e}")))
}

async fn read_file(field: Field<'_>) -> Result<ImageUpload, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;

    Ok(ImageUpload {
        file_name,
        content_type,
        bytes,
    })
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
