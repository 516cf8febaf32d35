use axum::http::StatusCode;

use crate::model_manager::ModelError;

/// Coarse category of a failed diagnosis, used for status mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    FetchFailure,
    DecodeFailure,
    InferenceFailure,
}

impl ErrorKind {
    /// True for failures caused by the request or the remote image rather than by this service.
    pub fn is_client_side(self) -> bool {
        !matches!(self, Self::InferenceFailure)
    }
}

/// Represents the different ways a diagnosis request can fail.
///
/// `Display` carries the full internal cause and is meant for logs; callers
/// receive [`DiagnosisError::public_message`] instead.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("No URL received")]
    MissingUrl,
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),
    #[error("Invalid image URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Image request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Image URL responded with HTTP {0}")]
    FetchStatus(u16),
    #[error("Image exceeds the {limit} byte limit")]
    ImageTooLarge { limit: u64 },
    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Decoded image has no pixels")]
    EmptyImage,
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
    #[error("Inference error: {0}")]
    Inference(String),
    #[error("Model returned class index {0}, which has no label")]
    UnknownLabel(usize),
}

impl DiagnosisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingUrl | Self::InvalidRequest(_) | Self::InvalidUrl { .. } => {
                ErrorKind::InvalidInput
            }
            Self::Fetch(_) | Self::FetchStatus(_) | Self::ImageTooLarge { .. } => {
                ErrorKind::FetchFailure
            }
            Self::Decode(_) | Self::EmptyImage => ErrorKind::DecodeFailure,
            Self::ModelUnavailable(_) | Self::Inference(_) | Self::UnknownLabel(_) => {
                ErrorKind::InferenceFailure
            }
        }
    }

    /// Message safe to return to callers: no file paths or runtime internals.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingUrl => "No URL received".to_string(),
            Self::InvalidRequest(_) => {
                "Request body must be a JSON object with a \"url\" field".to_string()
            }
            Self::InvalidUrl { .. } => "Invalid image URL".to_string(),
            Self::Fetch(_) => "Failed to fetch image from URL".to_string(),
            Self::FetchStatus(code) => format!("Image URL responded with HTTP {}", code),
            Self::ImageTooLarge { limit } => format!("Image exceeds the {} byte limit", limit),
            Self::Decode(_) | Self::EmptyImage => "Could not decode image data".to_string(),
            Self::ModelUnavailable(_) => "Model is not available".to_string(),
            Self::Inference(_) | Self::UnknownLabel(_) => "Inference failed".to_string(),
        }
    }

    /// Status used when the server runs with typed error statuses.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => match self.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::FetchFailure => StatusCode::BAD_GATEWAY,
                ErrorKind::DecodeFailure => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::InferenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}
