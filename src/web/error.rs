use crate::services::media::MediaError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Application error: {:?}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Internal server error"})),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = match &self {
            MediaError::AuthExpired => StatusCode::UNAUTHORIZED,
            MediaError::PermissionDenied => StatusCode::FORBIDDEN,
            MediaError::NotFound => StatusCode::NOT_FOUND,
            MediaError::Unknown(detail) => {
                tracing::error!("Media action failed: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({
            "error": self,
            "message": self.user_message(),
        });
        (status, Json(body)).into_response()
    }
}
