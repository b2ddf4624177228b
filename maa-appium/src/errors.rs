use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("No active driver session: {0}")]
    SessionNotCreated(String),

    #[error("WebDriver transport error: {0}")]
    Transport(String),

    #[error("WebDriver command '{command}' failed: {message}")]
    WebDriver {
        command: String,
        error: Option<String>,
        message: String,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid custom parameter: {0}")]
    InvalidParameter(String),

    #[error("Template path segment '{segment}' not found at {path}")]
    MissingPathSegment { path: String, segment: String },

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AutomationError {
    fn from(err: reqwest::Error) -> Self {
        AutomationError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AutomationError {
    fn from(err: serde_json::Error) -> Self {
        AutomationError::InvalidParameter(err.to_string())
    }
}

impl From<image::ImageError> for AutomationError {
    fn from(err: image::ImageError) -> Self {
        AutomationError::Image(err.to_string())
    }
}

impl From<std::io::Error> for AutomationError {
    fn from(err: std::io::Error) -> Self {
        AutomationError::Resource(err.to_string())
    }
}
