use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router, middleware};
use chrono::Utc;
use tracing::info;

use bcx_types::api::UploadResponse;

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::AppState;

/// Per-file cap; the route's body limit sits above it so oversized files get
/// our fixed 413 message instead of a bare framework rejection.
const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
const BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

const TYPE_MESSAGE: &str = "Only image files are allowed (png, jpg, jpeg, webp, gif, svg)";
const SIZE_MESSAGE: &str = "File too large (max 5MB)";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

/// `POST /api/upload`: multipart field `file`, images only, 5 MB cap.
/// The stored name gets a millisecond timestamp suffix, which is also how
/// concurrent uploads with the same client-side name avoid colliding.
async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart body".into()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mimetype = field.content_type().unwrap_or_default().to_string();
        if !is_allowed_image(&mimetype) {
            return Err(ApiError::BadRequest(TYPE_MESSAGE.into()));
        }

        let original_name = field.file_name().map(|n| n.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::PayloadTooLarge(SIZE_MESSAGE.into()))?;
        if data.len() > MAX_FILE_BYTES {
            return Err(ApiError::PayloadTooLarge(SIZE_MESSAGE.into()));
        }

        let filename = build_filename(original_name.as_deref(), Utc::now().timestamp_millis());
        let path = state.upload_dir.join(&filename);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| anyhow::Error::from(e).context("writing upload"))?;

        info!("Stored upload {} ({} bytes)", filename, data.len());

        let url = format!("{}/uploads/{}", request_origin(&headers), filename);
        return Ok(Json(UploadResponse {
            url,
            filename,
            size: data.len(),
            mimetype,
        }));
    }

    Err(ApiError::BadRequest("No file".into()))
}

fn is_allowed_image(mimetype: &str) -> bool {
    matches!(
        mimetype,
        "image/png" | "image/jpeg" | "image/jpg" | "image/webp" | "image/gif" | "image/svg+xml"
    )
}

/// `<sanitized-base>-<millis><ext>`: whitespace collapses to `_`, path
/// separators are stripped, and a missing extension becomes `.bin`.
fn build_filename(original: Option<&str>, now_millis: i64) -> String {
    let original = original.unwrap_or("file");
    // Drop any client-supplied directory part.
    let leaf = original
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("file");

    let (base, ext) = match leaf.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() => {
            (base.to_string(), format!(".{ext}"))
        }
        _ => (leaf.trim_end_matches('.').to_string(), ".bin".to_string()),
    };

    let mut clean = String::with_capacity(base.len());
    for c in base.chars() {
        clean.push(if c.is_whitespace() { '_' } else { c });
    }
    if clean.is_empty() {
        clean.push_str("file");
    }

    format!("{clean}-{now_millis}{ext}")
}

/// Rebuild the externally visible origin, trusting the reverse proxy's
/// forwarding headers when present.
fn request_origin(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(axum::http::header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_mime_filter() {
        assert!(is_allowed_image("image/png"));
        assert!(is_allowed_image("image/svg+xml"));
        assert!(!is_allowed_image("application/pdf"));
        assert!(!is_allowed_image("image/tiff"));
        assert!(!is_allowed_image(""));
    }

    #[test]
    fn filename_is_sanitized_and_stamped() {
        assert_eq!(
            build_filename(Some("my photo.png"), 1700000000000),
            "my_photo-1700000000000.png"
        );
        assert_eq!(
            build_filename(Some("../../etc/passwd"), 7),
            "passwd-7.bin"
        );
        assert_eq!(build_filename(Some("noext"), 7), "noext-7.bin");
        assert_eq!(build_filename(None, 7), "file-7.bin");
    }
}
