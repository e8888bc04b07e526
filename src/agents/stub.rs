use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AnalysisError, AnalysisGateway};

/// Gateway returning a canned outcome and counting calls.
pub struct StubAgent {
    outcome: Result<Option<String>, AnalysisError>,
    calls: AtomicUsize,
}

impl StubAgent {
    pub fn text(text: &str) -> Self {
        Self::with(Ok(Some(text.to_string())))
    }

    pub fn empty() -> Self {
        Self::with(Ok(None))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Err(AnalysisError::Service(message.to_string())))
    }

    pub fn with(outcome: Result<Option<String>, AnalysisError>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisGateway for StubAgent {
    async fn analyze_signature(&self, _image_data_url: &str) -> Result<Option<String>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
