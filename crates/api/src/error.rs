use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use domain::error::DomainError;

/// API error taxonomy. Every handler failure is one of these, and each
/// maps to a stable HTTP status plus a machine-readable error code.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Validation(String),
    Internal(String),
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::ExternalService(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| ValidationDetail {
                    field: field.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value for {field}")),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };
        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn statuses_match_variants() {
        assert_eq!(
            status_of(ApiError::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiError::Forbidden("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ApiError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Conflict("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ApiError::ServiceUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_of(DomainError::validation("bad").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::not_found("gone").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::forbidden("no").into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::conflict("dup").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::external("fs down").into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn single_validator_error_becomes_its_message() {
        #[derive(Validate)]
        struct Input {
            #[validate(length(min = 3, message = "name too short"))]
            name: String,
        }

        let err = Input {
            name: "ab".to_string(),
        }
        .validate()
        .unwrap_err();
        let api: ApiError = err.into();
        match api {
            ApiError::Validation(msg) => assert_eq!(msg, "name too short"),
            other => panic!("expected validation, got {other:?}"),
        }
    }

    #[test]
    fn multiple_validator_errors_are_summarized() {
        #[derive(Validate)]
        struct Input {
            #[validate(length(min = 3, message = "name too short"))]
            name: String,
            #[validate(email(message = "invalid email"))]
            email: String,
        }

        let err = Input {
            name: "ab".to_string(),
            email: "nope".to_string(),
        }
        .validate()
        .unwrap_err();
        let api: ApiError = err.into();
        match api {
            ApiError::Validation(msg) => assert!(msg.contains("2 validation errors")),
            other => panic!("expected validation, got {other:?}"),
        }
    }

    #[test]
    fn internal_error_masks_message() {
        let response = ApiError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
