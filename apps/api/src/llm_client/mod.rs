/// LLM Client — the single point of entry for all model calls in SkillBridge.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Stages receive an `Arc<dyn LanguageModel>` and never build their own client.
///
/// Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
pub mod testing;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in SkillBridge.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 8192;
const TEMPERATURE: f32 = 0.2;
const MAX_RETRIES: u32 = 3;
const HTTP_TIMEOUT_SECS: u64 = 120;
/// Upper bound on web searches the model may run for a single grounded call.
const MAX_WEB_SEARCHES: u32 = 5;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Capability trait
// ────────────────────────────────────────────────────────────────────────────

/// A web source the model consulted while answering a grounded call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub url: String,
    pub title: String,
}

/// Text answer plus the web sources backing it, in first-seen order, unique by URL.
#[derive(Debug, Clone, Default)]
pub struct GroundedText {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// The text-generation collaborator every agent stage talks to.
///
/// Carried in `AppState` as `Arc<dyn LanguageModel>`; tests substitute a scripted stub.
/// Implementations own their transport concerns (timeouts, rate-limit backoff).
/// Callers never retry.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends `system` instructions and `user` content, returns the flattened text answer.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;

    /// Same as `complete`, with web search enabled so the answer can cite real pages.
    async fn complete_with_search(&self, system: &str, user: &str)
        -> Result<GroundedText, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
    /// Present on `web_search_tool_result` blocks: the list of pages returned by the search.
    pub content: Option<Value>,
    pub citations: Option<Vec<Citation>>,
}

#[derive(Debug, Deserialize)]
pub struct Citation {
    pub url: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates every text block. Tool-using answers are split across several
    /// blocks, so taking only the first one would truncate the answer.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Collects the web pages the model saw, from search results and text citations.
    pub fn grounding_sources(&self) -> Vec<GroundingSource> {
        let mut sources: Vec<GroundingSource> = Vec::new();
        let mut push = |url: &str, title: &str| {
            if !url.is_empty() && !sources.iter().any(|s| s.url == url) {
                sources.push(GroundingSource {
                    url: url.to_string(),
                    title: title.to_string(),
                });
            }
        };

        for block in &self.content {
            match block.block_type.as_str() {
                "web_search_tool_result" => {
                    // On search failure `content` is an error object, not an array.
                    let Some(results) = block.content.as_ref().and_then(Value::as_array) else {
                        continue;
                    };
                    for result in results {
                        let url = result.get("url").and_then(Value::as_str).unwrap_or("");
                        let title = result.get("title").and_then(Value::as_str).unwrap_or("");
                        push(url, title);
                    }
                }
                "text" => {
                    for citation in block.citations.iter().flatten() {
                        push(
                            citation.url.as_deref().unwrap_or(""),
                            citation.title.as_deref().unwrap_or(""),
                        );
                    }
                }
                _ => {}
            }
        }

        sources
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by all agents in SkillBridge.
/// Wraps the Anthropic Messages API with transport retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            api_key,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        tools: Option<Vec<Value>>,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            tools,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(retryable_error(status.as_u16(), body, attempt));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Error kept for a retryable response. A 429 becomes `RateLimited`, carrying
/// the number of retries already spent.
fn retryable_error(status: u16, body: String, attempt: u32) -> LlmError {
    if status == 429 {
        LlmError::RateLimited { retries: attempt }
    } else {
        LlmError::Api {
            status,
            message: body,
        }
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let response = self.call(user, system, None).await?;
        response.text().ok_or(LlmError::EmptyContent)
    }

    async fn complete_with_search(
        &self,
        system: &str,
        user: &str,
    ) -> Result<GroundedText, LlmError> {
        let response = self.call(user, system, Some(vec![web_search_tool()])).await?;
        let sources = response.grounding_sources();
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        debug!("Grounded call returned {} sources", sources.len());
        Ok(GroundedText { text, sources })
    }
}

fn web_search_tool() -> Value {
    json!({
        "type": "web_search_20250305",
        "name": "web_search",
        "max_uses": MAX_WEB_SEARCHES,
    })
}
