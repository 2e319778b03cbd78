use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::OracleConfig;

/// External reasoning model used for question generation and answer grading.
/// Callers own prompt construction and response parsing.
#[async_trait]
pub trait GradingOracle: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),
    #[error("oracle transport failure: {0}")]
    Transport(String),
    #[error("oracle returned no text")]
    EmptyResponse,
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Run a single oracle call under a hard deadline. Blank output counts as empty.
pub(crate) async fn generate_within(
    oracle: &dyn GradingOracle,
    prompt: &str,
    limit: Duration,
) -> Result<String, OracleError> {
    let text = match tokio::time::timeout(limit, oracle.generate(prompt)).await {
        Ok(result) => result?,
        Err(_) => return Err(OracleError::Timeout(limit)),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(OracleError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}

/// Oracle used when no model credentials are configured; every call degrades.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineOracle;

#[async_trait]
impl GradingOracle for OfflineOracle {
    async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Unavailable("no oracle credentials configured".to_string()))
    }
}

/// Client for the hosted `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiOracle {
    pub fn new(config: &OracleConfig, api_key: String) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|err| OracleError::Transport(err.to_string()))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ContentCandidate>,
}

#[derive(Debug, Deserialize)]
struct ContentCandidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

fn first_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.text)
}

#[async_trait]
impl GradingOracle for GeminiOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Transport(format!("status {status}")));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?;

        first_text(payload).ok_or(OracleError::EmptyResponse)
    }
}
