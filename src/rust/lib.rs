//! Chest X-ray classification over HTTP, backed by an ONNX model.
//!
//! The service fetches an image from a caller supplied URL, converts it to a
//! 224x224 single-channel tensor, runs the model and reports one of three
//! diagnoses (`Bacterial`, `Normal`, `Viral`) with a percentage confidence.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use lungscan::{serve, AppState, ServerConfig};
//!
//! let config = ServerConfig::default();
//! let state = Arc::new(AppState::from_config(&config)?);
//!
//! // Load once up front; requests reuse the same session.
//! state.models().reload().await?;
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! serve(listener, state).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Classifying without the HTTP layer
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lungscan::{classify, preprocess, ModelLoader, ModelManager};
//!
//! let model = ModelManager::new_default().load()?;
//! let bytes = std::fs::read("chest.png")?;
//! let batch = preprocess(&bytes)?;
//! let prediction = classify(model.as_ref(), batch.view())?;
//! println!("{} ({}%)", prediction.predicted_label, prediction.confidence_level);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod imaging;
pub mod model_manager;
mod runtime;
pub mod server;

pub use classifier::{
    classify, Diagnosis, DiagnosisError, ErrorKind, ModelLoader, ModelStore, OnnxModel,
    Prediction, ProbabilityModel,
};
pub use config::{ErrorStatusMode, ServerConfig};
pub use imaging::{preprocess, FetchLimits, ImageFetcher, INPUT_SHAPE};
pub use model_manager::{ModelError, ModelManager};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};
pub use server::{router, serve, AppState};

/// Installs `env_logger` with an `info` default filter, overridable through `RUST_LOG`.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
