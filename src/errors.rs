use crate::api::ApiResponse;
use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] anyhow::Error),

    #[error("Content generation failed: {0}")]
    LLMError(String),

    #[error("Resource already exists: {0}")]
    DuplicateResource(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
            user_friendly_message: None,
        }
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl ApiError {
    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(self, context: ErrorContext) -> ErrorResponse {
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(
                        context
                            .user_friendly_message
                            .unwrap_or_else(|| format!("{} not found", capitalize(&context.resource_type))),
                    )),
                )
            }
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Rejected request"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(
                        context.user_friendly_message.unwrap_or_else(|| self.to_string()),
                    )),
                )
            }
            ApiError::DuplicateResource(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Duplicate resource"
                );
                (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::LLMError(detail) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    error = %self,
                    "Generation service error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(detail.clone())),
                )
            }
            ApiError::ServiceUnavailable(detail) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    error = %self,
                    "Service unavailable"
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiResponse::error(detail.clone())),
                )
            }
            ApiError::DatabaseError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Database error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(
                        "Database operation failed. Please try again.".to_string(),
                    )),
                )
            }
            ApiError::InternalError(detail) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Internal server error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(detail.clone())),
                )
            }
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Helper macro for structured error responses
#[macro_export]
macro_rules! api_error {
    (not_found, $operation:expr, $resource_type:expr, $id:expr) => {
        $crate::errors::ApiError::NotFound(format!("{} with id '{}' not found", $resource_type, $id))
            .to_response_with_context(
                $crate::errors::ErrorContext::new($operation, $resource_type).with_id($id),
            )
    };

    (validation, $operation:expr, $resource_type:expr, $message:expr) => {
        $crate::errors::ApiError::ValidationError($message.to_string())
            .to_response_with_context($crate::errors::ErrorContext::new($operation, $resource_type))
    };

    (database, $operation:expr, $resource_type:expr, $error:expr) => {
        $crate::errors::classify_database_error(&$error)
            .to_response_with_context($crate::errors::ErrorContext::new($operation, $resource_type))
    };

    (llm, $operation:expr, $resource_type:expr, $error:expr) => {
        $crate::errors::ApiError::LLMError($error.to_string())
            .to_response_with_context($crate::errors::ErrorContext::new($operation, $resource_type))
    };
}

/// Detect the error type from a data-access failure
pub fn classify_database_error(error: &anyhow::Error) -> ApiError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("already exists") || error_str.contains("unique constraint") {
        // e.g. "UNIQUE constraint failed: students.name"
        if let Some(column) = error_str.split("failed:").nth(1) {
            return ApiError::DuplicateResource(format!(
                "A record with the same {} already exists",
                column.trim()
            ));
        }
        ApiError::DuplicateResource("Resource already exists".to_string())
    } else if error_str.contains("foreign key constraint") {
        ApiError::NotFound("Referenced resource not found".to_string())
    } else if error_str.contains("cannot be null") || error_str.contains("not null constraint") {
        ApiError::ValidationError("Required field is missing or invalid".to_string())
    } else {
        ApiError::DatabaseError(anyhow::anyhow!("{}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("update_student", "student")
            .with_id(42)
            .with_user_message("Custom message");

        assert_eq!(context.operation, "update_student");
        assert_eq!(context.resource_type, "student");
        assert_eq!(context.resource_id, Some("42".to_string()));
        assert_eq!(
            context.user_friendly_message,
            Some("Custom message".to_string())
        );
    }

    #[test]
    fn test_error_classification() {
        let duplicate_error = anyhow::anyhow!("UNIQUE constraint failed: students.name");
        match classify_database_error(&duplicate_error) {
            ApiError::DuplicateResource(message) => assert!(message.contains("students.name")),
            other => panic!("expected duplicate, got {:?}", other),
        }

        let fk_error = anyhow::anyhow!("FOREIGN KEY constraint failed");
        assert!(matches!(classify_database_error(&fk_error), ApiError::NotFound(_)));

        let null_error = anyhow::anyhow!("NOT NULL constraint failed: flashcards.front");
        assert!(matches!(classify_database_error(&null_error), ApiError::ValidationError(_)));

        let other = anyhow::anyhow!("disk I/O error");
        assert!(matches!(classify_database_error(&other), ApiError::DatabaseError(_)));
    }

    fn respond(error: ApiError) -> ErrorResponse {
        error.to_response_with_context(ErrorContext::new("test", "resource"))
    }

    #[test]
    fn test_api_error_responses() {
        let error = ApiError::NotFound("Student not found".to_string());
        let context = ErrorContext::new("get_student", "student").with_id(7);
        let (status, Json(body)) = error.to_response_with_context(context);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.as_deref(), Some("Student not found"));

        let (status, _) = respond(ApiError::ValidationError("Invalid data".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = respond(ApiError::DuplicateResource("Already exists".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, Json(body)) = respond(ApiError::LLMError("quota exceeded".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.as_deref(), Some("quota exceeded"));

        let (status, _) = respond(ApiError::ServiceUnavailable("not configured".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
