use crate::error::{ApiError, ApiResult};
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

/// An uploaded file spooled to the upload directory.
///
/// The file is removed when the guard is dropped, so early returns on any
/// failure path never leave it behind. [`TempUpload::remove`] deletes it
/// explicitly and reports the error instead of only logging it.
pub struct TempUpload {
    path: Option<TempPath>,
    file_name: Option<String>,
    size: u64,
}

impl TempUpload {
    /// Stream a multipart field into a fresh temp file under `dir`.
    pub async fn spool(dir: &Path, mut field: Field<'_>) -> ApiResult<Self> {
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let (file, path) = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(dir)?
            .into_parts();

        // Construct the guard first so a failed write still cleans up
        let mut upload = Self {
            path: Some(path),
            file_name,
            size: 0,
        };

        let mut file = tokio::fs::File::from_std(file);
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            file.write_all(&chunk).await?;
            upload.size += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(
            path = %upload.path().display(),
            file_name = upload.file_name.as_deref().unwrap_or(""),
            content_type = content_type.as_deref().unwrap_or(""),
            size = upload.size,
            "Upload spooled to disk"
        );

        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }

    /// Delete the file now, surfacing any error.
    pub fn remove(mut self) -> io::Result<()> {
        match self.path.take() {
            Some(path) => path.close(),
            None => Ok(()),
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let path_str = path.display().to_string();
            if let Err(e) = path.close() {
                tracing::warn!(path = %path_str, error = %e, "Failed to delete temporary upload");
            }
        }
    }
}

/// Body-limit overflows become 413, every other stream error 400.
pub(crate) fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(err.body_text());
    }
    ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
}
