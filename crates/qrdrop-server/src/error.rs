use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use qrdrop_gate::{GateError, Rejection};
use qrdrop_render::RenderError;
use qrdrop_store::StoreError;
use serde_json::json;
use thiserror::Error;

const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; text-align: center; padding: 50px;">
    <h1>Image Not Found</h1>
    <p>The image has expired or was not found.</p>
    <a href="/" style="color: #007bff; text-decoration: none;">&larr; Back to Upload</a>
  </body>
</html>
"#;

const EXPIRED_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; text-align: center; padding: 50px;">
    <h1>Image Expired</h1>
    <p>This image is no longer available.</p>
    <a href="/" style="color: #007bff; text-decoration: none;">&larr; Upload a New Image</a>
  </body>
</html>
"#;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The request is malformed; the message is shown to the client.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload rejected: {0}")]
    Rejected(Rejection),

    #[error("image not found")]
    NotFound,

    #[error("image expired")]
    Expired,

    #[error("gate error: {0}")]
    Gate(#[from] GateError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Rejection> for ServerError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected(Rejection::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Rejected(Rejection::UnsupportedType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Rejected(Rejection::InvalidImage { .. }) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Expired => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::BadRequest(message) => (
                status,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
            Self::Rejected(rejection) => (
                status,
                Json(json!({
                    "success": false,
                    "error": rejection.user_message(),
                    "code": rejection.code(),
                })),
            )
                .into_response(),
            Self::NotFound => (
                status,
                [(header::CACHE_CONTROL, "no-store")],
                Html(NOT_FOUND_PAGE),
            )
                .into_response(),
            Self::Expired => (
                status,
                [(header::CACHE_CONTROL, "no-store")],
                Html(EXPIRED_PAGE),
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    status,
                    Json(json!({ "success": false, "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
