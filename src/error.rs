//! Error taxonomy for the `/predict` endpoint and its HTTP mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No image uploaded")]
    MissingInput,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Malformed upload: {0}")]
    Payload(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Preview encoding failed: {0}")]
    Encoding(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Blocking task was cancelled")]
    Blocking,
}

impl PredictError {
    /// Message returned to the caller. Server-side faults never leak details.
    pub fn public_message(&self) -> String {
        match self {
            PredictError::MissingInput
            | PredictError::InvalidImage(_)
            | PredictError::TooLarge { .. } => self.to_string(),
            PredictError::Payload(_) => "Malformed upload".to_string(),
            PredictError::Inference(_) => "Inference failed".to_string(),
            PredictError::Encoding(_) | PredictError::Storage(_) | PredictError::Blocking => {
                "Internal server error".to_string()
            }
        }
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingInput
            | PredictError::InvalidImage(_)
            | PredictError::Payload(_) => StatusCode::BAD_REQUEST,
            PredictError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::Inference(_)
            | PredictError::Encoding(_)
            | PredictError::Storage(_)
            | PredictError::Blocking => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Prediction failed: {}", self);
        } else {
            warn!("Rejected prediction request: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.public_message(),
        })
    }
}
