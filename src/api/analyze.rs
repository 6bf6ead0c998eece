//! Blood report upload and analysis.
//!
//! Accepts one multipart file field (`bloodReport`), checks the declared type
//! first and then the size while streaming, and hands the buffered bytes to
//! the [`HealthAdvisor`].
//!
//! [`HealthAdvisor`]: crate::advisor::HealthAdvisor

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

use crate::AppState;
use crate::domain::{AnalyzeResponse, UPLOAD_FIELD, UploadedFile};
use crate::error::AppError;

/// POST /api/analyze
pub async fn analyze_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection, "Request body is not multipart");
        AppError::MissingFile
    })?;

    let limit = state.config.limits.max_upload_bytes;
    let advisor = &state.advisor;
    let file = read_upload(&mut multipart, limit, |ct| advisor.accepts(ct))
        .await?
        .ok_or(AppError::MissingFile)?;

    tracing::info!(
        name: "analysis.received",
        filename = %file.filename,
        content_type = %file.content_type,
        bytes = file.size(),
        "Received blood report"
    );

    let result = state.advisor.analyze(file).await?;
    Ok(Json(result.into()))
}

/// Pull the report out of the multipart stream.
///
/// Returns `Ok(None)` when no file field named [`UPLOAD_FIELD`] is present.
/// Other fields are skipped. The declared type is checked with `accepts`
/// before any of the body is buffered.
pub async fn read_upload(
    multipart: &mut Multipart,
    limit: usize,
    accepts: impl Fn(&str) -> bool,
) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !accepts(&content_type) {
            return Err(AppError::UnsupportedMediaType { content_type });
        }

        let data = read_limited(field, limit).await?;
        return Ok(Some(UploadedFile {
            filename,
            content_type,
            data,
        }));
    }
    Ok(None)
}

/// Buffer one field, failing as soon as it grows past `limit`.
async fn read_limited(mut field: Field<'_>, limit: usize) -> Result<Bytes, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if buf.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge { limit_bytes: limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit_bytes: limit }
    } else {
        AppError::Unhandled(anyhow::anyhow!("multipart parse failed: {}", err.body_text()))
    }
}
