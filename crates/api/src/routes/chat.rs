use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain::models::{AttachmentOutcome, AttachmentUpload, ChatMessage, MessageAttachment};

use crate::app::AppState;
use crate::config::LimitsConfig;
use crate::error::ApiError;
use crate::middleware::user_auth::CurrentUser;
use crate::services::chat::ChatService;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedMessageResponse {
    pub message: ChatMessage,
    pub attachments: Vec<AttachmentOutcomeBody>,
}

/// Per-file upload result. A failed file reports its reason; the
/// message itself still stands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentOutcomeBody {
    pub file_name: String,
    pub uploaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<MessageAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<AttachmentOutcome> for AttachmentOutcomeBody {
    fn from(outcome: AttachmentOutcome) -> Self {
        match outcome {
            AttachmentOutcome::Uploaded(attachment) => Self {
                file_name: attachment.file_name.clone(),
                uploaded: true,
                attachment: Some(attachment),
                reason: None,
            },
            AttachmentOutcome::Failed { file_name, reason } => Self {
                file_name,
                uploaded: false,
                attachment: None,
                reason: Some(reason),
            },
        }
    }
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let messages = ChatService::new(state.store.clone())
        .transcript(order_id)
        .await?;
    Ok(Json(messages))
}

/// Accepts a multipart body: one optional `message` text field plus any
/// number of `files` parts.
pub async fn post_message(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostedMessageResponse>), ApiError> {
    let (text, files) = read_message_parts(multipart, &state.config.limits).await?;

    let posted = ChatService::new(state.store.clone())
        .post_message(order_id, &current.0, &text, files)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostedMessageResponse {
            message: posted.message,
            attachments: posted.outcomes.into_iter().map(Into::into).collect(),
        }),
    ))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateMessageRequest>,
) -> Result<Json<ChatMessage>, ApiError> {
    request.validate()?;
    let message = ChatService::new(state.store.clone())
        .update_message(message_id, &current.0, &request.message)
        .await?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    ChatService::new(state.store.clone())
        .delete_message(message_id, &current.0)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_message_parts(
    mut multipart: Multipart,
    limits: &LimitsConfig,
) -> Result<(String, Vec<AttachmentUpload>), ApiError> {
    let mut text = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("message") => {
                text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Unreadable message field: {e}")))?;
            }
            Some("files") => {
                if files.len() >= limits.max_attachments_per_message {
                    return Err(ApiError::Validation(format!(
                        "At most {} files per message",
                        limits.max_attachments_per_message
                    )));
                }
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        ApiError::Validation("Each file part needs a filename".to_string())
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
                files.push(AttachmentUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok((text, files))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_body_carries_failure_reason() {
        let body = AttachmentOutcomeBody::from(AttachmentOutcome::Failed {
            file_name: "arte.pdf".to_string(),
            reason: "blob store unavailable".to_string(),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["fileName"], "arte.pdf");
        assert_eq!(json["uploaded"], false);
        assert_eq!(json["reason"], "blob store unavailable");
        assert!(json.get("attachment").is_none());
    }

    #[test]
    fn update_request_rejects_blank_message() {
        let request = UpdateMessageRequest {
            message: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
