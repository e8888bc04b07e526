use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{AnalysisError, AnalysisGateway};
use crate::config::Config;

pub const SIGNATURE_PROMPT: &str = "Analyze the uploaded signature image and write a personality analysis in exactly 250 characters. Start with “This signature reflects…”. Write one short insight-style paragraph with balanced traits and a realistic future tendency. Do not add extra text.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct OpenAiAgent {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
    max_tokens: u32,
}

impl OpenAiAgent {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            endpoint: format!("{}/chat/completions", config.openai_base_url),
            max_tokens: config.openai_max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, image_data_url: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: SIGNATURE_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url,
                        },
                    },
                ],
            }],
            max_completion_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl AnalysisGateway for OpenAiAgent {
    async fn analyze_signature(&self, image_data_url: &str) -> Result<Option<String>, AnalysisError> {
        if image_data_url.is_empty() {
            return Err(AnalysisError::MissingImage);
        }
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;

        info!(
            "Requesting signature analysis with model {} (image length: {} chars)",
            self.model,
            image_data_url.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(image_data_url))
            .send()
            .await
            .map_err(|e| AnalysisError::Request(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Request(format!("Response read failed: {}", e)))?;

        if !status.is_success() {
            warn!("Analysis service returned {} for model {}", status, self.model);
            return Err(AnalysisError::Service(service_error_message(status, &text)));
        }

        parse_analysis(&text)
    }
}

fn service_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Analysis service returned {}", status))
}

fn parse_analysis(body: &str) -> Result<Option<String>, AnalysisError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::Parse(format!("Parse error: {}", e)))?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|t| !t.trim().is_empty()))
}
