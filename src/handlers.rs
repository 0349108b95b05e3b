use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::PredictError;
use crate::models::PredictionResult;
use crate::preprocess;
use crate::upload::{self, blocking, StagedUpload};
use crate::AppState;

/// POST /predict - Classify an uploaded MRI image
///
/// Expects a multipart body with a file field named `image`. Responds with the
/// predicted label, per-label percentages and a base64 JPEG of the 150x150
/// image the model saw.
///
/// # Errors
/// - 400 Bad Request: no `image` field, or the bytes are not an image
/// - 413 Payload Too Large: upload over the configured limit
/// - 500 Internal Server Error: inference or storage failure
pub async fn predict(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let request_id = Uuid::new_v4();

    let staged = upload::stage_image(
        &mut payload,
        &state.settings.upload_dir,
        state.settings.max_upload_bytes,
    )
    .await?;
    debug!("[{}] Staged {} bytes at {}", request_id, staged.len(), staged.path().display());

    let result = blocking(move || classify_upload(&state, staged)).await?;

    info!(
        "[{}] Predicted {} ({:.2}%)",
        request_id,
        result.predicted_label,
        result.prediction_probabilities[&result.predicted_label]
    );

    Ok(HttpResponse::Ok().json(result))
}

/// Decode, classify and re-encode one staged upload. The temp file is removed
/// before returning, on every path.
fn classify_upload(
    state: &AppState,
    staged: StagedUpload,
) -> Result<PredictionResult, PredictError> {
    if staged.is_empty() {
        return Err(PredictError::InvalidImage("image is empty".to_string()));
    }

    let image = preprocess::load_image(staged.path())?;
    let prepared = preprocess::preprocess(&image, state.settings.channel_order);

    let tensor = prepared.tensor();
    let scores = state.classifier.classify(tensor, tensor, tensor)?;
    let preview = prepared.to_base64_jpeg(state.settings.jpeg_quality)?;
    let result = PredictionResult::from_scores(&scores, preview)?;

    staged.close()?;
    Ok(result)
}
