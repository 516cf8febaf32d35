use ndarray::ArrayView4;
use serde::Serialize;

mod error;
mod labels;
mod model;
mod store;
mod utils;

pub use error::{DiagnosisError, ErrorKind};
pub use labels::Diagnosis;
pub use model::{ModelLoader, OnnxModel, ProbabilityModel};
pub use store::ModelStore;

use utils::{argmax, confidence_percent};

/// Outcome of a successful diagnosis, serialized as the `/diagnose` response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Label of the most probable class
    pub predicted_label: Diagnosis,
    /// Probability of that class as a percentage, two decimals
    pub confidence_level: f64,
    pub success: bool,
}

impl Prediction {
    /// Picks the most probable class (lowest index on ties) and formats its confidence.
    pub fn from_probabilities(probabilities: &[f32]) -> Result<Self, DiagnosisError> {
        if let Some(pos) = probabilities.iter().position(|p| !p.is_finite()) {
            return Err(DiagnosisError::Inference(format!(
                "Model output {} is not finite ({})",
                pos, probabilities[pos]
            )));
        }

        let (index, probability) = argmax(probabilities)
            .ok_or_else(|| DiagnosisError::Inference("Model produced no output".into()))?;
        let predicted_label =
            Diagnosis::from_index(index).ok_or(DiagnosisError::UnknownLabel(index))?;

        Ok(Self {
            predicted_label,
            confidence_level: confidence_percent(probability),
            success: true,
        })
    }
}

/// Runs `model` on a preprocessed batch and maps its output to a [`Prediction`].
pub fn classify(
    model: &dyn ProbabilityModel,
    batch: ArrayView4<'_, f32>,
) -> Result<Prediction, DiagnosisError> {
    let probabilities = model.predict(batch)?;
    log::debug!("Class probabilities: {:?}", probabilities);
    Prediction::from_probabilities(&probabilities)
}
