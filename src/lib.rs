pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod preprocess;
pub mod upload;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::web;

use crate::classifier::Classifier;
use crate::config::PipelineSettings;

pub use crate::error::PredictError;
pub use crate::models::{PredictionResult, LABELS};

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub settings: PipelineSettings,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, settings: PipelineSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }
}

/// Register the service routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(handlers::predict)));
}

/// Cross-origin policy: every origin, method and header is allowed.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
}
