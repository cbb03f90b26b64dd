use thiserror::Error;

#[derive(Error, Debug)]
pub enum WheelError {
    #[error("Invalid weight for '{label}': {reason}")]
    InvalidWeight { label: String, reason: String },

    #[error("Wheel layout has no segments")]
    EmptyLayout,

    #[error("Invalid spin parameters: {0}")]
    InvalidSpinParameters(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Font Error: {0}")]
    Font(String),
}

impl WheelError {
    pub(crate) fn invalid_weight(label: &str, reason: impl Into<String>) -> Self {
        WheelError::InvalidWeight {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}
