use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::classifier::{classify, DiagnosisError, ModelStore, Prediction};
use crate::config::{ErrorStatusMode, ServerConfig};
use crate::imaging::{preprocess, ImageFetcher};

const LOADED_MESSAGE: &str = "Model loaded successfully!";
const LOAD_FAILED_MESSAGE: &str = "Failed to load model";

/// State shared by every request handler.
pub struct AppState {
    models: ModelStore,
    fetcher: ImageFetcher,
    error_status: ErrorStatusMode,
}

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppState {
    pub fn new(models: ModelStore, fetcher: ImageFetcher, error_status: ErrorStatusMode) -> Self {
        Self {
            models,
            fetcher,
            error_status,
        }
    }

    /// Builds the state with an empty model store; call
    /// [`ModelStore::reload`] to load eagerly.
    pub fn from_config(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        let models = ModelStore::new(Arc::new(config.model_manager()));
        let fetcher = ImageFetcher::new(config.fetch_limits)?;
        Ok(Self::new(models, fetcher, config.error_status))
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    fn error_response(&self, status: StatusCode, message: String) -> Response {
        let status = match self.error_status {
            ErrorStatusMode::Compat => StatusCode::OK,
            ErrorStatusMode::Typed => status,
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }

    fn reject(&self, err: DiagnosisError) -> Response {
        if err.kind().is_client_side() {
            warn!("Diagnosis rejected ({:?}): {}", err.kind(), err);
        } else {
            error!("Diagnosis failed ({:?}): {}", err.kind(), err);
        }
        self.error_response(err.status(), err.public_message())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/load-model", get(load_model))
        .route("/diagnose", post(diagnose))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

async fn hello() -> &'static str {
    "hello"
}

async fn load_model(State(state): State<Arc<AppState>>) -> Response {
    let start_time = Instant::now();
    match state.models.reload().await {
        Ok(_) => {
            info!("Model loaded via /load-model (took {:.2?})", start_time.elapsed());
            Json(MessageBody {
                message: LOADED_MESSAGE,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to load model: {}", e);
            state.error_response(StatusCode::SERVICE_UNAVAILABLE, LOAD_FAILED_MESSAGE.to_string())
        }
    }
}

async fn diagnose(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let start_time = Instant::now();
    match run_diagnosis(&state, &body).await {
        Ok(prediction) => {
            info!(
                "Diagnosis: {} ({}%) in {:.2?}",
                prediction.predicted_label,
                prediction.confidence_level,
                start_time.elapsed()
            );
            Json(prediction).into_response()
        }
        Err(e) => state.reject(e),
    }
}

/// Extracts the image URL from a `{"url": "..."}` body. A missing, `null` or
/// empty `url` is reported as [`DiagnosisError::MissingUrl`].
fn image_url(body: &[u8]) -> Result<String, DiagnosisError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| DiagnosisError::InvalidRequest(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(DiagnosisError::InvalidRequest("body is not a JSON object".into()));
    };

    match fields.remove("url") {
        None | Some(Value::Null) => Err(DiagnosisError::MissingUrl),
        Some(Value::String(url)) if url.is_empty() => Err(DiagnosisError::MissingUrl),
        Some(Value::String(url)) => Ok(url),
        Some(other) => Err(DiagnosisError::InvalidRequest(format!(
            "\"url\" must be a string, got {}",
            other
        ))),
    }
}

async fn run_diagnosis(state: &AppState, body: &[u8]) -> Result<Prediction, DiagnosisError> {
    let url = image_url(body)?;
    info!("Diagnosing image from {}", url);

    let fetch_start = Instant::now();
    let bytes = state.fetcher.fetch(&url).await?;
    debug!("Fetched {} bytes in {:.2?}", bytes.len(), fetch_start.elapsed());

    let model = state.models.get_or_load().await?;

    let inference_start = Instant::now();
    let prediction = tokio::task::spawn_blocking(move || {
        let batch = preprocess(&bytes)?;
        classify(model.as_ref(), batch.view())
    })
    .await
    .map_err(|e| DiagnosisError::Inference(format!("Inference task failed: {}", e)))??;
    debug!("Preprocessing and inference took {:.2?}", inference_start.elapsed());

    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_extraction() {
        assert_eq!(
            image_url(br#"{"url": "https://example.com/a.png"}"#).unwrap(),
            "https://example.com/a.png"
        );
        assert_eq!(
            image_url(br#"{"url": "http://x/y.jpg", "extra": 1}"#).unwrap(),
            "http://x/y.jpg"
        );
    }

    #[test]
    fn test_missing_url_variants() {
        for body in [&br#"{}"#[..], br#"{"url": null}"#, br#"{"url": ""}"#] {
            assert!(
                matches!(image_url(body), Err(DiagnosisError::MissingUrl)),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_malformed_bodies() {
        for body in [&b""[..], b"not json", br#"["https://example.com/a.png"]"#, br#"{"url": 42}"#] {
            assert!(
                matches!(image_url(body), Err(DiagnosisError::InvalidRequest(_))),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
