//! Error types for the log shipper

pub type Result<T> = std::result::Result<T, ShipperError>;

#[derive(Debug, thiserror::Error)]
pub enum ShipperError {
    /// No API key configured; the shipper cannot be constructed
    #[error("Datadog API key is missing. Set DATADOG_API_KEY environment variable.")]
    MissingApiKey,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Network-level failure while sending a batch
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Intake answered with a non-success status
    #[error("Intake rejected batch with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ShipperError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        ShipperError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        ShipperError::Transport {
            message: msg.into(),
        }
    }

    /// Create a status error for a rejected request
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        ShipperError::HttpStatus {
            status,
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for ShipperError {
    fn from(err: reqwest::Error) -> Self {
        ShipperError::transport(err.to_string())
    }
}
