//! Black-box model invocation.
//!
//! The trained network has three image input branches. The service feeds the
//! same preprocessed tensor to all three.

use std::path::Path;

use tract_onnx::prelude::*;
use tracing::info;

use crate::error::PredictError;
use crate::preprocess::{ImageTensor, IMAGE_SIZE};

/// Number of image inputs in the model signature.
pub const INPUT_BRANCHES: usize = 3;

pub trait Classifier: Send + Sync {
    /// Run one forward pass and return the raw score vector, one entry per label.
    fn classify(
        &self,
        first: &ImageTensor,
        second: &ImageTensor,
        third: &ImageTensor,
    ) -> Result<Vec<f32>, PredictError>;
}

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX model executed with tract. Loaded once, shared read-only.
pub struct OnnxClassifier {
    plan: Plan,
}

impl OnnxClassifier {
    /// Load and optimise the model. Every input is pinned to
    /// `f32[1, IMAGE_SIZE, IMAGE_SIZE, 3]`, so an artifact that does not
    /// expose three image inputs is rejected here.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let side = IMAGE_SIZE as usize;

        let mut model = tract_onnx::onnx().model_for_path(path)?;
        let inputs = model.input_outlets()?.len();
        if inputs != INPUT_BRANCHES {
            anyhow::bail!(
                "model at {} has {} inputs, expected {}",
                path.display(),
                inputs,
                INPUT_BRANCHES
            );
        }
        for slot in 0..INPUT_BRANCHES {
            model = model.with_input_fact(slot, f32::fact([1, side, side, 3]).into())?;
        }

        let plan = model.into_optimized()?.into_runnable()?;
        info!("Loaded classifier from {}", path.display());

        Ok(Self { plan })
    }
}

fn to_tract(input: &ImageTensor) -> Result<Tensor, PredictError> {
    let tensor = tract_ndarray::Array4::from_shape_vec(input.dim(), input.iter().copied().collect())
        .map_err(|e| PredictError::Inference(format!("bad input shape: {}", e)))?
        .into_tensor();
    Ok(tensor)
}

impl Classifier for OnnxClassifier {
    fn classify(
        &self,
        first: &ImageTensor,
        second: &ImageTensor,
        third: &ImageTensor,
    ) -> Result<Vec<f32>, PredictError> {
        let inputs = tvec!(
            to_tract(first)?.into(),
            to_tract(second)?.into(),
            to_tract(third)?.into()
        );

        let outputs = self
            .plan
            .run(inputs)
            .map_err(|e| PredictError::Inference(format!("{:#}", e)))?;
        let scores = outputs
            .first()
            .ok_or_else(|| PredictError::Inference("model produced no outputs".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| PredictError::Inference(format!("{:#}", e)))?
            .iter()
            .copied()
            .collect();

        Ok(scores)
    }
}
