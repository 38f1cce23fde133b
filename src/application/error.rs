use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Json(e) => (StatusCode::BAD_REQUEST, format!("JSON error: {}", e)),
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("IO error: {}", e))
            }
        };

        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn get_response_body(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        let body_str = String::from_utf8(bytes.to_vec()).unwrap();
        (status, body_str)
    }

    #[tokio::test]
    async fn test_bad_request_error() {
        let error = AppError::BadRequest("repo is required".to_string());
        let response = error.into_response();
        let (status, body) = get_response_body(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("repo is required"));
    }

    #[tokio::test]
    async fn test_io_error_is_internal() {
        let error: AppError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "tmp not writable").into();
        let (status, body) = get_response_body(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("tmp not writable"));
    }

    #[tokio::test]
    async fn test_json_error_response_format() {
        let error = AppError::BadRequest("invalid branch '-x'".to_string());
        let response = error.into_response();
        let (_, body) = get_response_body(response).await;

        // Response should be JSON with "detail" field
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.get("detail").unwrap(), "invalid branch '-x'");
    }

    #[test]
    fn test_json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json");
        let app_error: AppError = json_err.unwrap_err().into();
        assert!(matches!(app_error, AppError::Json(_)));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_error: AppError = io_err.into();
        assert!(matches!(app_error, AppError::Io(_)));
    }
}
