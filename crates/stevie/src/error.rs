//! Error types for request normalization, argument narrowing, and response construction.

/// HTTP status codes used when an error has to be rendered as a response.
pub mod status_codes {
    pub const BAD_REQUEST: u16 = 400;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// All errors produced outside of handler execution.
///
/// Handler failures are plain `anyhow::Error` values and never surface
/// through this type; they are caught and turned into 500 responses by the
/// dispatch adapters.
#[derive(thiserror::Error, Debug)]
pub enum StevieError {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Invalid base64 body: {0}")]
    InvalidBase64(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl StevieError {
    pub fn status_code(&self) -> u16 {
        use status_codes::*;
        match self {
            StevieError::MalformedBody(_)
            | StevieError::InvalidBase64(_)
            | StevieError::MissingArgument(_)
            | StevieError::InvalidArgument { .. } => BAD_REQUEST,
            StevieError::Json(_) | StevieError::Io(_) | StevieError::Transport(_) => {
                INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type StevieResult<T> = Result<T, StevieError>;
