use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed AI response: {0}")]
    Malformed(String),
}

/// A generative text backend. `json` asks the model to answer with a JSON
/// object instead of prose.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextService: Send + Sync {
    async fn generate(&self, prompt: &str, json: bool) -> Result<String, AnalysisError>;
}
