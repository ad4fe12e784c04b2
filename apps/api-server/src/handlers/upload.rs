//! Image upload handler.
//!
//! Accepts a multipart form with an `image` field and writes it to the
//! local upload directory, where it is served statically under `/uploads`.
//! Single attempt, no retry.

use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use futures_util::TryStreamExt;

use quill_shared::dto::UploadResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/upload
pub async fn image(state: web::Data<AppState>, mut payload: Multipart) -> AppResult<HttpResponse> {
    let mut saved: Option<String> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        // Keep only the extension of the client-supplied name.
        let extension = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .and_then(|name| Path::new(name).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let filename = format!("image-{}{}", Utc::now().timestamp_millis(), extension);

        let mut data = web::BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            data.extend_from_slice(&chunk);
        }

        let path = state.upload_dir.join(&filename);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {e}")))?;

        tracing::info!(file = %filename, bytes = data.len(), "Image uploaded");

        saved = Some(filename);
    }

    let filename = saved.ok_or_else(|| AppError::BadRequest("No image file provided".to_string()))?;

    Ok(HttpResponse::Ok().json(UploadResponse {
        message: "Image Uploaded".to_string(),
        image: format!("/uploads/{filename}"),
    }))
}
