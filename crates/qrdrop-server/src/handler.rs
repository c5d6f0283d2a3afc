use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use qrdrop_gate::Rejection;
use qrdrop_render::{render, to_data_uri};
use qrdrop_store::{Lookup, NewImage};
use qrdrop_types::{ImageId, ImageType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    /// PNG code image as a `data:` URI.
    pub qr_code: String,
    pub image_url: String,
    pub image_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub preview: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".into(),
        }
    }
}

/// The `file` part of a multipart request, read into memory.
#[derive(Debug)]
struct Upload {
    bytes: Bytes,
    declared_type: Option<String>,
}

/// `POST /api/upload`: validate, store, and return a code for the image URL.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let upload = read_upload(&mut multipart, state.config.max_upload_bytes).await?;
    let content_type = validate_upload(&state, &upload).await?;

    let store = Arc::clone(&state.store);
    let image = NewImage::new(upload.bytes, content_type);
    let meta = run_blocking(move || store.insert(image)).await??;

    let image_url = format!("{}/image/{}", base_url(&state.config, &headers), meta.id);
    let qr_png = match render(&image_url, &state.config.render) {
        Ok(png) => png,
        Err(e) => {
            // The client never sees this id, so the record must not outlive the request.
            let store = Arc::clone(&state.store);
            let id = meta.id;
            if let Err(remove_err) = run_blocking(move || store.remove(&id)).await? {
                warn!(id = ?meta.id, error = %remove_err, "failed to discard unrendered image");
            }
            return Err(e.into());
        }
    };

    info!(
        id = ?meta.id,
        content_type = %meta.content_type,
        size = meta.size,
        expires_at = %meta.expires_at,
        "image uploaded"
    );
    Ok(Json(UploadResponse {
        success: true,
        message: "Image uploaded successfully!".into(),
        qr_code: to_data_uri(ImageType::Png.mime(), &qr_png),
        image_url,
        image_id: meta.id.to_token(),
        expires_at: meta.expires_at,
    }))
}

/// `POST /api/preview`: validate and echo the upload back as a data URI.
pub async fn preview(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<PreviewResponse>> {
    let upload = read_upload(&mut multipart, state.config.max_upload_bytes).await?;
    let content_type = validate_upload(&state, &upload).await?;
    Ok(Json(PreviewResponse {
        success: true,
        preview: to_data_uri(content_type.mime(), &upload.bytes),
    }))
}

/// `GET /image/:id`: serve the stored bytes while the image is visible.
pub async fn image(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ServerResult<Response> {
    let Ok(id) = token.parse::<ImageId>() else {
        debug!(token = %token, "unparsable image token");
        return Err(ServerError::NotFound);
    };

    let store = Arc::clone(&state.store);
    match run_blocking(move || store.get(&id)).await?? {
        Lookup::Found(record) => {
            let max_age = record.meta.remaining_at(state.clock.now()).num_seconds();
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, record.content_type().mime().to_string()),
                    (header::CACHE_CONTROL, format!("private, max-age={max_age}")),
                    (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
                ],
                record.bytes,
            )
                .into_response())
        }
        Lookup::NotFound => Err(ServerError::NotFound),
        Lookup::Expired => Err(ServerError::Expired),
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Fallback for every unrouted path.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}

/// Pull the `file` field out of a multipart body.
///
/// The field is read chunk by chunk and abandoned as soon as it grows past
/// `limit`, so an oversized upload is never fully buffered.
async fn read_upload(multipart: &mut Multipart, limit: u64) -> ServerResult<Upload> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if field.file_name() == Some("") {
            return Err(ServerError::BadRequest("No file selected.".into()));
        }
        let declared_type = field.content_type().map(str::to_owned);

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            let size = (buf.len() + chunk.len()) as u64;
            if size > limit {
                debug!(size, limit, "upload aborted mid-stream");
                return Err(Rejection::TooLarge { size, limit }.into());
            }
            buf.extend_from_slice(&chunk);
        }
        return Ok(Upload {
            bytes: buf.freeze(),
            declared_type,
        });
    }
    Err(ServerError::BadRequest("No file provided.".into()))
}

fn multipart_error(err: MultipartError, limit: u64) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // The body limit tripped before the field did; the real size is unknown.
        return Rejection::TooLarge {
            size: limit.saturating_add(1),
            limit,
        }
        .into();
    }
    debug!(error = %err.body_text(), "malformed multipart body");
    ServerError::BadRequest("Malformed upload.".into())
}

async fn validate_upload(state: &AppState, upload: &Upload) -> ServerResult<ImageType> {
    let gate = Arc::clone(&state.gate);
    let bytes = upload.bytes.clone();
    let declared = upload.declared_type.clone();
    let result = run_blocking(move || gate.validate(&bytes, declared.as_deref())).await??;
    Ok(result.into_verdict()?)
}

/// Run CPU- or disk-bound work off the async workers.
async fn run_blocking<T, F>(f: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))
}

/// Origin for retrieval URLs: the configured base, else the request's own.
fn base_url(config: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(base) = &config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| *s == "http" || *s == "https")
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| config.bind_addr.to_string());
    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn base_url_from_host_header() {
        let config = ServerConfig::default();
        let h = headers(&[("host", "qr.example:8080")]);
        assert_eq!(base_url(&config, &h), "http://qr.example:8080");
    }

    #[test]
    fn base_url_honours_forwarded_proto() {
        let config = ServerConfig::default();
        let h = headers(&[("host", "qr.example"), ("x-forwarded-proto", "https, http")]);
        assert_eq!(base_url(&config, &h), "https://qr.example");

        let bogus = headers(&[("host", "qr.example"), ("x-forwarded-proto", "gopher")]);
        assert_eq!(base_url(&config, &bogus), "http://qr.example");
    }

    #[test]
    fn configured_base_url_wins() {
        let config = ServerConfig {
            public_base_url: Some("https://drop.example/".into()),
            ..ServerConfig::default()
        };
        let h = headers(&[("host", "internal:5000")]);
        assert_eq!(base_url(&config, &h), "https://drop.example");
    }

    #[test]
    fn missing_host_falls_back_to_bind_address() {
        let config = ServerConfig::default();
        assert_eq!(base_url(&config, &HeaderMap::new()), "http://0.0.0.0:5000");
    }

    #[test]
    fn health_response_default() {
        assert_eq!(HealthResponse::default().status, "healthy");
    }
}
