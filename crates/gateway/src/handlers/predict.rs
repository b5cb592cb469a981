use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, PredictResponse};
use crate::upload::{TempUpload, multipart_error};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    response::{IntoResponse, Response},
};

const MISSING_UPLOAD: &str = "No file uploaded.";

/// `POST /predict`: classify the image in the upload field.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match handle_predict(&state, multipart).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "Rejecting prediction request");
            e.into_response_with(state.error_format)
        }
    }
}

async fn handle_predict(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<PredictResponse> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let upload = find_upload(state, &mut multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request(MISSING_UPLOAD))?;

    tracing::info!(
        file_name = upload.file_name().unwrap_or(""),
        size = upload.size(),
        "Received upload"
    );

    let bytes = upload.read().await?;
    let prediction = state.service.predict(bytes).await?;

    upload.remove()?;

    Ok(PredictResponse::from(prediction))
}

/// Spool the first file part named like the configured upload field. Other
/// fields, and text parts without a filename, are skipped.
async fn find_upload(state: &AppState, multipart: &mut Multipart) -> ApiResult<Option<TempUpload>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(&*state.upload_field) && field.file_name().is_some() {
            return TempUpload::spool(&state.upload_dir, field).await.map(Some);
        }
    }

    Ok(None)
}
