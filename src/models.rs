use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Class names, index-aligned with the model output vector.
pub const LABELS: [&str; 4] = ["glioma", "meningioma", "notumor", "pituitary"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of a successful `/predict` call.
///
/// `prediction_probabilities` is a `BTreeMap` so keys come out in label order
/// (the labels are already alphabetical).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResult {
    pub predicted_label: String,
    pub prediction_probabilities: BTreeMap<String, f64>,
    pub preprocessed_image: String,
}

impl PredictionResult {
    /// Builds the response from the raw class scores returned by the model.
    ///
    /// The top label is the argmax of the raw scores (first index wins on a
    /// tie). Each score is reported as a percentage rounded to 2 decimals.
    pub fn from_scores(scores: &[f32], preprocessed_image: String) -> Result<Self, PredictError> {
        if scores.len() != LABELS.len() {
            return Err(PredictError::Inference(format!(
                "expected {} class scores, model returned {}",
                LABELS.len(),
                scores.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(PredictError::Inference(format!(
                "model returned non-finite score {}",
                bad
            )));
        }

        let best = argmax(scores);
        let prediction_probabilities = LABELS
            .iter()
            .zip(scores)
            .map(|(label, &score)| (label.to_string(), to_percentage(score)))
            .collect();

        Ok(Self {
            predicted_label: LABELS[best].to_string(),
            prediction_probabilities,
            preprocessed_image,
        })
    }
}

fn argmax(scores: &[f32]) -> usize {
    scores
        .iter()
        .enumerate()
        .fold(0, |best, (i, score)| if *score > scores[best] { i } else { best })
}

fn to_percentage(score: f32) -> f64 {
    (f64::from(score) * 100.0 * 100.0).round() / 100.0
}
