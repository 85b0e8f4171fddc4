//! Loading agent configuration (prompts + reading activity settings) from TOML.
//!
//! Example file (every key optional):
//!
//! ```toml
//! [reading]
//! hunt_advance_delay_ms = 1500
//! analysis_timeout_secs = 30
//!
//! [prompts]
//! tutor_system = "You are a patient Chinese tutor."
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub reading: ReadingSettings,
}

/// Timing knobs for the selection engine.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReadingSettings {
  /// How long a hunt match is shown before moving to the next target.
  pub hunt_advance_delay_ms: u64,
  /// Upper bound on a deep-reading analysis call.
  pub analysis_timeout_secs: u64,
}

impl Default for ReadingSettings {
  fn default() -> Self {
    Self { hunt_advance_delay_ms: 1500, analysis_timeout_secs: 30 }
  }
}

impl ReadingSettings {
  pub fn hunt_advance_delay(&self) -> Duration {
    Duration::from_millis(self.hunt_advance_delay_ms)
  }

  pub fn analysis_timeout(&self) -> Duration {
    Duration::from_secs(self.analysis_timeout_secs)
  }
}

/// Prompts used by the model client. Templates use `{key}` placeholders.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub analyze_system: String,
  pub analyze_user_template: String,
  pub grade_system: String,
  pub grade_user_template: String,
  pub compare_system: String,
  pub compare_user_template: String,
  pub tutor_system: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      analyze_system: "You are a Chinese reading assistant. Respond ONLY with strict JSON.".into(),
      analyze_user_template: "Analyze the following Chinese text fragment within the context of an article about Chinese Character Simplification.\nText: \"{text}\"\n\nProvide:\n1. Pinyin with tone marks.\n2. English translation.\n3. A brief cultural or etymological note explaining why this word/phrase is significant in the context of language evolution or the specific argument being made.\n\nReturn JSON {\"pinyin\": string, \"translation\": string, \"culturalContext\": string}.".into(),
      grade_system: "You are a strict reading-comprehension grader. Respond ONLY with strict JSON.".into(),
      grade_user_template: "Context Article: {context}\n\nQuestion: {question}\nUser Answer: {answer}\n\nEvaluate the user's answer based STRICTLY on the text provided.\nIs it correct? Provide specific feedback citing the text.\n\nReturn JSON {\"isCorrect\": boolean, \"feedback\": string}.".into(),
      compare_system: "You are an expert in Chinese script history. Respond ONLY with strict JSON.".into(),
      compare_user_template: "Compare the Traditional and Simplified forms of the concept/character related to: \"{concept}\".\nIf the input is a concept (like \"Love\"), pick a representative character (like 愛 vs 爱).\nExplain the visual difference and the logic behind the simplification (e.g., phonetic substitution, removal of components).\n\nReturn JSON {\"traditional\": string, \"simplified\": string, \"explanation\": string}.".into(),
      tutor_system: "You are a helpful and knowledgeable Chinese language tutor. The user is reading an article about the history and necessity of simplifying Chinese characters (Traditional vs Simplified). Help them understand vocabulary, grammar structures, and the historical arguments presented in the text. Be encouraging and concise.".into(),
    }
  }
}

/// Parse a TOML document into `AgentConfig`.
pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "jianhua_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "jianhua_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "jianhua_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
