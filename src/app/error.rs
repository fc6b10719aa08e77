use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignpostError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Index load error: {0}")]
    IndexLoad(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Image fetch error: {0}")]
    ImageFetch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SignpostError>;
