//! Chunk upload handler (worker).
//!
//! Clients send the binary part before the descriptive fields, so the
//! chunk is held in memory until the whole form has been read. The body
//! limit caps what one request can hold.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use bytes::Bytes;

use mediahub_core::error::AppError;
use mediahub_core::types::UploadSessionId;
use mediahub_service::ChunkMeta;

use crate::dto::response::{ApiResponse, ChunkUploadResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, parse_id};
use crate::state::WorkerState;

/// Fields of one chunk form, in whatever order they arrived.
#[derive(Debug, Default)]
struct ChunkForm {
    data: Option<Bytes>,
    file_name: Option<String>,
    file_type: Option<String>,
    file_size: Option<String>,
    duration: Option<String>,
    chunk_index: Option<String>,
    total_chunks: Option<String>,
}

impl ChunkForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read chunk: {e}")))?;
                form.data = Some(data);
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::validation(format!("Invalid field {name}: {e}")))?;
            let slot = match name.as_str() {
                "fileName" => &mut form.file_name,
                "fileType" => &mut form.file_type,
                "fileSize" => &mut form.file_size,
                "fileDuration" | "duration" => &mut form.duration,
                "chunkIndex" => &mut form.chunk_index,
                "totalChunks" => &mut form.total_chunks,
                _ => continue,
            };
            *slot = Some(text);
        }
        Ok(form)
    }

    fn into_parts(self) -> Result<(ChunkMeta, Bytes), AppError> {
        let data = self
            .data
            .ok_or_else(|| AppError::validation("No chunk data provided"))?;
        let file_name = self
            .file_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::validation("fileName is required"))?;

        let meta = ChunkMeta {
            chunk_index: required_number(self.chunk_index, "chunkIndex")?,
            total_chunks: required_number(self.total_chunks, "totalChunks")?,
            file_size: required_number(self.file_size, "fileSize")?,
            duration: optional_number(self.duration, "fileDuration")?,
            file_type: self.file_type.filter(|t| !t.trim().is_empty()),
            file_name,
        };
        Ok((meta, data))
    }
}

fn required_number<T: std::str::FromStr>(value: Option<String>, field: &str) -> Result<T, AppError> {
    optional_number(value, field)?.ok_or_else(|| AppError::validation(format!("{field} is required")))
}

fn optional_number<T: std::str::FromStr>(
    value: Option<String>,
    field: &str,
) -> Result<Option<T>, AppError> {
    match value.as_deref().map(str::trim) {
        None | Some("") | Some("undefined") | Some("null") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::validation(format!("{field} must be a number"))),
    }
}

/// POST /api/uploads/{session_id}
pub async fn upload_chunk(
    State(state): State<WorkerState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ChunkUploadResponse>>, ApiError> {
    let session_id: UploadSessionId = parse_id(&session_id)?;
    let (meta, data) = ChunkForm::read(multipart).await?.into_parts()?;

    let outcome = state
        .ingest
        .save_chunk(&auth, session_id, meta, &data[..])
        .await?;
    Ok(Json(ApiResponse::ok(outcome.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ChunkForm {
        ChunkForm {
            data: Some(Bytes::from_static(b"abc")),
            file_name: Some("clip.mp4".into()),
            file_type: Some("video/mp4".into()),
            file_size: Some("9".into()),
            duration: Some("12.5".into()),
            chunk_index: Some("1".into()),
            total_chunks: Some("3".into()),
        }
    }

    #[test]
    fn test_form_into_meta() {
        let (meta, data) = form().into_parts().unwrap();
        assert_eq!(meta.chunk_index, 1);
        assert_eq!(meta.total_chunks, 3);
        assert_eq!(meta.file_size, 9);
        assert_eq!(meta.duration, Some(12.5));
        assert_eq!(&data[..], b"abc");
    }

    #[test]
    fn test_missing_duration_is_allowed() {
        let mut f = form();
        f.duration = Some("undefined".into());
        assert_eq!(f.into_parts().unwrap().0.duration, None);
    }

    #[test]
    fn test_rejects_bad_numbers_and_missing_data() {
        let mut f = form();
        f.chunk_index = Some("-1".into());
        assert!(f.into_parts().is_err());

        let mut f = form();
        f.data = None;
        assert!(f.into_parts().is_err());

        let mut f = form();
        f.total_chunks = None;
        assert!(f.into_parts().is_err());
    }
}
