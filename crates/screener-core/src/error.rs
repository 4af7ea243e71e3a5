use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Decode error: {0}")]
    DecodeError(String),
}
