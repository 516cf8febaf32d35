use std::collections::HashMap;
use std::sync::Arc;

use ndarray::ArrayView4;
use ort::session::Session;
use ort::value::Tensor;

use super::error::DiagnosisError;
use crate::model_manager::ModelError;

/// Anything that turns a preprocessed image batch into class probabilities.
///
/// Implementations are shared across request handlers, so they must be `Send + Sync`
/// and must not need `&mut self` to run.
pub trait ProbabilityModel: Send + Sync {
    /// Runs a forward pass over a `(1, 224, 224, 1)` batch and returns the
    /// probability of each class, in label-table order.
    fn predict(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, DiagnosisError>;
}

/// Produces a fresh model instance, typically by reading an artifact from disk.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn ProbabilityModel>, ModelError>;
}

/// A [`ProbabilityModel`] backed by an ONNX Runtime session.
#[derive(Debug)]
pub struct OnnxModel {
    session: Session,
    input_name: String,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxModel>();
    }
};

impl OnnxModel {
    pub fn new(session: Session) -> Result<Self, ModelError> {
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| ModelError::InvalidSignature("model has no inputs".to_string()))?;

        Ok(Self {
            session,
            input_name,
        })
    }
}

impl ProbabilityModel for OnnxModel {
    fn predict(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, DiagnosisError> {
        let input_dyn = batch.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input).map_err(|e| {
                DiagnosisError::Inference(format!("Failed to create input tensor: {}", e))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| DiagnosisError::Inference(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            DiagnosisError::Inference(format!("Failed to extract output tensor: {}", e))
        })?;

        Ok(output_tensor.iter().copied().collect())
    }
}
