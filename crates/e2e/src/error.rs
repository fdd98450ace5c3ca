//! Error types for the verification runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright driver error: {0}")]
    Playwright(String),

    #[error("Server unreachable after {0} probe attempts")]
    ServerUnreachable(usize),

    #[error("Unknown flow: {0}")]
    UnknownFlow(String),

    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type E2eResult<T> = Result<T, E2eError>;
