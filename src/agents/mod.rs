mod openai;
#[cfg(test)]
pub mod stub;

pub use openai::OpenAiAgent;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by an analysis call. The `Display` text is what gets stored
/// as a failure record's error message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("OPENAI_API_KEY not configured")]
    MissingApiKey,

    #[error("Signature image is required")]
    MissingImage,

    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Service(String),

    #[error("{0}")]
    Parse(String),
}

/// A single blocking call to a vision-capable text generation service.
///
/// `Ok(None)` means the service answered but produced no usable text.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze_signature(&self, image_data_url: &str) -> Result<Option<String>, AnalysisError>;
}
