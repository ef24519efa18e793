//! # Custom Extractors
//!
//! Provides a helper to extract JSON bodies and [`read_upload`] for
//! multipart spreadsheet uploads.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::Multipart;
use axum::Json;

use crate::error::AppError;

/// Multipart field carrying the uploaded workbook.
pub const UPLOAD_FIELD: &str = "file";

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Read the bytes of the `file` field of a multipart upload. Other fields
/// are ignored.
pub async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<u8>, AppError> {
    let mut multipart = multipart.map_err(|err| AppError::BadRequest(err.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".to_string()));
        }
        tracing::debug!(file = ?file_name, bytes = bytes.len(), "received upload");
        return Ok(bytes.to_vec());
    }

    Err(AppError::BadRequest(format!(
        "multipart field '{UPLOAD_FIELD}' is missing"
    )))
}
