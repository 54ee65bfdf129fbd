//! Prompt router: the single seam toward the LLM completion oracle.
//!
//! We only call chat.completions. The router picks the system prompt for the
//! active mode, performs exactly one outbound call (no retries), and hands
//! the raw reply text back; interpreting it is the classifier's job.
//! Calls are instrumented and log model names and latencies (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::Mode;
use crate::error::ChatError;

const ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// `send(text, mode) -> raw reply text`. Implemented over HTTP in
/// production; tests script it.
#[async_trait]
pub trait PromptRouter: Send + Sync {
  async fn send(&self, text: &str, mode: Mode) -> Result<String, ChatError>;
}

#[derive(Clone)]
pub struct OracleClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OracleClient {
  /// Construct the client if we find ORACLE_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("ORACLE_API_KEY").ok()?;
    let base_url =
      std::env::var("ORACLE_BASE_URL").unwrap_or_else(|_| "https://api.groq.com/openai/v1".into());
    let model =
      std::env::var("ORACLE_MODEL").unwrap_or_else(|_| "llama-3.1-8b-instant".into());

    let client = reqwest::Client::builder()
      .timeout(ORACLE_TIMEOUT)
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// One chat completion round-trip: system + user message in, text out.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model, user_len = user.len()))]
  async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "coursepilot-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| ChatError::Transport(format!("completion API unreachable: {e}")))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      // An explicit error envelope is a provider error; anything else is transport.
      return match extract_provider_error(&body) {
        Some(msg) => Err(ChatError::Provider(msg)),
        None => Err(ChatError::Transport(format!("completion API HTTP {status}"))),
      };
    }

    let body: ChatCompletionResponse = res
      .json()
      .await
      .map_err(|e| ChatError::Transport(format!("invalid completion envelope: {e}")))?;

    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "oracle usage");
    }

    if let Some(err) = body.error {
      return Err(ChatError::Provider(err.message));
    }

    let text = body.choices
      .and_then(|cs| cs.into_iter().next())
      .and_then(|c| c.message.content);

    let elapsed = start.elapsed();
    match text {
      Some(t) if !t.trim().is_empty() => {
        info!(?elapsed, reply_len = t.len(), "oracle reply received");
        Ok(t.trim().to_string())
      }
      _ => {
        error!(?elapsed, "oracle returned neither content nor error");
        Err(ChatError::Transport("invalid response from completion API".into()))
      }
    }
  }
}

/// Production router: per-mode system prompt over an optional oracle client.
/// With no API key configured, every send fails with an explanatory
/// provider message rather than a panic.
pub struct OracleRouter {
  oracle: Option<OracleClient>,
  prompts: Prompts,
}

impl OracleRouter {
  pub fn new(oracle: Option<OracleClient>, prompts: Prompts) -> Self {
    Self { oracle, prompts }
  }
}

#[async_trait]
impl PromptRouter for OracleRouter {
  #[instrument(level = "info", skip(self, text), fields(%mode, text_len = text.len()))]
  async fn send(&self, text: &str, mode: Mode) -> Result<String, ChatError> {
    let Some(oracle) = &self.oracle else {
      return Err(ChatError::Provider("Completion API key not configured in server settings.".into()));
    };
    let system = self.prompts.system_for(mode);
    oracle.complete(system, text).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)] choices: Option<Vec<ChatChoice>>,
  #[serde(default)] usage: Option<Usage>,
  #[serde(default)] error: Option<ProviderErrorBody>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct ProviderErrorBody { message: String }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from a provider error body.
fn extract_provider_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: ProviderErrorBody }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn provider_error_extracted_from_envelope() {
    let body = r#"{"error":{"message":"model overloaded"}}"#;
    assert_eq!(extract_provider_error(body).as_deref(), Some("model overloaded"));
  }

  #[test]
  fn non_error_body_yields_none() {
    assert!(extract_provider_error("Bad Gateway").is_none());
  }

  #[tokio::test]
  async fn unconfigured_router_reports_provider_error() {
    let router = OracleRouter::new(None, Prompts::default());
    match router.send("make a course", Mode::Assistant).await {
      Err(ChatError::Provider(msg)) => assert!(msg.contains("not configured")),
      other => panic!("expected provider error, got {other:?}"),
    }
  }
}
