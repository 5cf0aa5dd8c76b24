use thiserror::Error;

#[derive(Error, Debug)]
pub enum GleanerError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Reviews feed not found: {0}")]
    FeedNotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GleanerError>;

impl From<chromiumoxide::error::CdpError> for GleanerError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        GleanerError::Browser(e.to_string())
    }
}
