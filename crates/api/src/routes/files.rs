use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use uuid::Uuid;

use domain::models::{AttachmentUpload, FileCategory, OrderFile};

use crate::app::AppState;
use crate::config::LimitsConfig;
use crate::error::ApiError;
use crate::middleware::user_auth::CurrentUser;
use crate::services::files::FileService;

pub async fn list_order_files(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<OrderFile>>, ApiError> {
    let files = FileService::new(state.store.clone())
        .list_for_order(order_id)
        .await?;
    Ok(Json(files))
}

pub async fn upload_order_file(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<OrderFile>), ApiError> {
    let (upload, category) = read_file_part(multipart, &state.config.limits).await?;
    let file = FileService::new(state.store.clone())
        .upload(Some(order_id), category, current.0.id, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(file)))
}

/// Files in the shared pool, not tied to any order.
pub async fn list_general_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderFile>>, ApiError> {
    let files = FileService::new(state.store.clone()).list_general().await?;
    Ok(Json(files))
}

pub async fn upload_general_file(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<OrderFile>), ApiError> {
    let (upload, category) = read_file_part(multipart, &state.config.limits).await?;
    let file = FileService::new(state.store.clone())
        .upload(None, category, current.0.id, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(file)))
}

/// Serves the stored bytes with the original name and content type.
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (file, bytes) = FileService::new(state.store.clone())
        .download(file_id)
        .await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.file_name.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, file.file_type.clone()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    FileService::new(state.store.clone()).delete(file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reads one `file` part plus an optional `category` text field.
/// Category defaults to `cliente`.
async fn read_file_part(
    mut multipart: Multipart,
    limits: &LimitsConfig,
) -> Result<(AttachmentUpload, FileCategory), ApiError> {
    let mut upload: Option<AttachmentUpload> = None;
    let mut category = FileCategory::Cliente;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        ApiError::Validation("The file part needs a filename".to_string())
                    })?;
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::Validation(format!("Unreadable file {file_name}: {e}"))
                })?;
                if bytes.len() > limits.max_upload_bytes {
                    return Err(ApiError::Validation(format!(
                        "File {file_name} exceeds the {} byte limit",
                        limits.max_upload_bytes
                    )));
                }
                upload = Some(AttachmentUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("category") => {
                let raw = field.text().await.map_err(|e| {
                    ApiError::Validation(format!("Unreadable category field: {e}"))
                })?;
                category = raw
                    .parse()
                    .map_err(|_| {
                        ApiError::Validation("Category must be cliente or interno".to_string())
                    })?;
            }
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| ApiError::Validation("A file part is required".to_string()))?;
    Ok((upload, category))
}
