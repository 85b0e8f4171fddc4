//! Minimal OpenAI-compatible chat client for the four collaborator operations.
//!
//! We only call chat.completions and request either plain text or a strict JSON
//! schema. Calls are instrumented and log model name, latency and token usage
//! (not contents).
//!
//! NOTE: We never log the API key and only log short previews of user text.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{AnalysisResult, ChatRole, ChatTurn, FormComparison, Grade};
use crate::error::CollaboratorError;
use crate::util::fill_template;

const CLIENT_USER_AGENT: &str = "jianhua-backend/0.1";

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = match reqwest::Client::builder().timeout(Duration::from_secs(20)).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "jianhua_backend", error = %e, "Failed to build HTTP client; model disabled");
        return None;
      }
    };

    Some(Self { client, api_key, base_url, model })
  }

  /// Send one chat completion and return the first choice's text.
  #[instrument(level = "info", skip(self, messages, response_format), fields(model = %self.model, turns = messages.len()))]
  async fn chat(
    &self,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    response_format: Option<ResponseFormat>,
  ) -> Result<String, CollaboratorError> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages,
      temperature,
      response_format,
      max_tokens: None,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, CLIENT_USER_AGENT)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      error!(elapsed = ?start.elapsed(), status = status.as_u16(), "Model call rejected");
      return Err(CollaboratorError::Http { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(elapsed = ?start.elapsed(), prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Model usage");
    }
    first_choice_text(body)
  }

  /// Single-turn call constrained by a JSON schema, decoded into `T`.
  async fn chat_structured<T: DeserializeOwned>(
    &self,
    system: &str,
    user: &str,
    schema_name: &str,
    schema: Value,
  ) -> Result<T, CollaboratorError> {
    let messages = vec![ChatMessageReq::new("system", system), ChatMessageReq::new("user", user)];
    let text = self.chat(messages, 0.2, Some(ResponseFormat::json_schema(schema_name, schema))).await?;
    decode_structured(&text)
  }

  // --- High-level helpers (domain-specialized) ---

  #[instrument(level = "info", skip(self, prompts, text), fields(text_len = text.chars().count()))]
  pub async fn analyze_fragment(&self, prompts: &Prompts, text: &str) -> Result<AnalysisResult, CollaboratorError> {
    let user = fill_template(&prompts.analyze_user_template, &[("text", text)]);
    self.chat_structured(&prompts.analyze_system, &user, "fragment_analysis", analysis_schema()).await
  }

  #[instrument(level = "info", skip(self, prompts, question, answer, context), fields(question_len = question.len(), answer_len = answer.len(), context_len = context.len()))]
  pub async fn grade_answer(
    &self,
    prompts: &Prompts,
    question: &str,
    answer: &str,
    context: &str,
  ) -> Result<Grade, CollaboratorError> {
    let user = fill_template(
      &prompts.grade_user_template,
      &[("context", context), ("question", question), ("answer", answer)],
    );
    self.chat_structured(&prompts.grade_system, &user, "answer_grade", grade_schema()).await
  }

  #[instrument(level = "info", skip(self, prompts, concept), fields(%concept))]
  pub async fn compare_forms(&self, prompts: &Prompts, concept: &str) -> Result<FormComparison, CollaboratorError> {
    let user = fill_template(&prompts.compare_user_template, &[("concept", concept)]);
    self.chat_structured(&prompts.compare_system, &user, "form_comparison", comparison_schema()).await
  }

  #[instrument(level = "info", skip(self, prompts, history, message), fields(history_len = history.len(), message_len = message.len()))]
  pub async fn converse(
    &self,
    prompts: &Prompts,
    history: &[ChatTurn],
    message: &str,
  ) -> Result<String, CollaboratorError> {
    let messages = conversation_messages(&prompts.tutor_system, history, message);
    let text = self.chat(messages, 0.7, None).await?;
    if text.is_empty() {
      return Err(CollaboratorError::Parse("empty tutor reply".into()));
    }
    Ok(text)
  }
}

/// System prompt, then prior turns, then the new user message.
fn conversation_messages(system: &str, history: &[ChatTurn], message: &str) -> Vec<ChatMessageReq> {
  let mut out = Vec::with_capacity(history.len() + 2);
  out.push(ChatMessageReq::new("system", system));
  for turn in history {
    let role = match turn.role {
      ChatRole::User => "user",
      ChatRole::Model => "assistant",
    };
    out.push(ChatMessageReq::new(role, &turn.text));
  }
  out.push(ChatMessageReq::new("user", message));
  out
}

fn first_choice_text(body: ChatCompletionResponse) -> Result<String, CollaboratorError> {
  body
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .map(|t| t.trim().to_string())
    .ok_or_else(|| CollaboratorError::Parse("no choices in completion".into()))
}

fn decode_structured<T: DeserializeOwned>(text: &str) -> Result<T, CollaboratorError> {
  serde_json::from_str::<T>(text.trim()).map_err(CollaboratorError::from)
}

fn object_schema(fields: &[(&str, &str)]) -> Value {
  let properties: serde_json::Map<String, Value> = fields
    .iter()
    .map(|(name, ty)| ((*name).to_string(), json!({ "type": ty })))
    .collect();
  let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
  json!({
    "type": "object",
    "properties": properties,
    "required": required,
    "additionalProperties": false,
  })
}

fn analysis_schema() -> Value {
  object_schema(&[("pinyin", "string"), ("translation", "string"), ("culturalContext", "string")])
}

fn grade_schema() -> Value {
  object_schema(&[("isCorrect", "boolean"), ("feedback", "string")])
}

fn comparison_schema() -> Value {
  object_schema(&[("traditional", "string"), ("simplified", "string"), ("explanation", "string")])
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}

#[derive(Serialize, Debug, PartialEq)]
struct ChatMessageReq { role: String, content: String }

impl ChatMessageReq {
  fn new(role: &str, content: &str) -> Self {
    Self { role: role.into(), content: content.into() }
  }
}

#[derive(Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")]
  r#type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  json_schema: Option<JsonSchemaSpec>,
}

impl ResponseFormat {
  fn json_schema(name: &str, schema: Value) -> Self {
    Self {
      r#type: "json_schema".into(),
      json_schema: Some(JsonSchemaSpec { name: name.into(), strict: true, schema }),
    }
  }
}

#[derive(Serialize)]
struct JsonSchemaSpec { name: String, strict: bool, schema: Value }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
