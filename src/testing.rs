//! Test doubles shared by the unit test modules.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::collaborator::Collaborator;
use crate::config::ReadingSettings;
use crate::content::ContentStore;
use crate::domain::{AnalysisResult, ChatTurn, FormComparison, Grade};
use crate::error::CollaboratorError;
use crate::state::AppState;

#[derive(Clone, Copy, Debug, Default)]
pub enum Outcome {
  #[default]
  Ok,
  Transport,
  Parse,
  Unconfigured,
}

/// Deterministic collaborator: fixed answers, optional per-text latency for
/// fragment analysis, and a record of grading calls.
#[derive(Default)]
pub struct FakeCollaborator {
  outcome: Outcome,
  delays: HashMap<String, Duration>,
  grades: Mutex<Vec<(String, String, String)>>,
}

impl FakeCollaborator {
  pub fn failing(outcome: Outcome) -> Self {
    Self { outcome, ..Self::default() }
  }

  pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
    self.delays.insert(text.to_string(), delay);
    self
  }

  pub fn grade_calls(&self) -> Vec<(String, String, String)> {
    self.grades.lock().unwrap().clone()
  }

  fn check(&self) -> Result<(), CollaboratorError> {
    match self.outcome {
      Outcome::Ok => Ok(()),
      Outcome::Transport => Err(CollaboratorError::Transport("connection reset".into())),
      Outcome::Parse => Err(CollaboratorError::Parse("missing field `pinyin`".into())),
      Outcome::Unconfigured => Err(CollaboratorError::ConfigurationMissing),
    }
  }
}

pub fn analysis_for(text: &str) -> AnalysisResult {
  AnalysisResult {
    pinyin: crate::pinyin::to_pinyin_diacritics(text),
    translation: format!("meaning of {text}"),
    cultural_context: "note".into(),
  }
}

#[async_trait]
impl Collaborator for FakeCollaborator {
  async fn analyze_fragment(&self, text: &str) -> Result<AnalysisResult, CollaboratorError> {
    if let Some(d) = self.delays.get(text) {
      tokio::time::sleep(*d).await;
    }
    self.check()?;
    Ok(analysis_for(text))
  }

  async fn grade_answer(&self, question: &str, answer: &str, context: &str) -> Result<Grade, CollaboratorError> {
    self.grades.lock().unwrap().push((question.into(), answer.into(), context.into()));
    self.check()?;
    Ok(Grade { is_correct: true, feedback: "Correct per text.".into() })
  }

  async fn compare_forms(&self, _concept: &str) -> Result<FormComparison, CollaboratorError> {
    self.check()?;
    Ok(FormComparison {
      traditional: "馬".into(),
      simplified: "马".into(),
      explanation: "Four dots became one stroke.".into(),
    })
  }

  async fn converse(&self, _history: &[ChatTurn], message: &str) -> Result<String, CollaboratorError> {
    self.check()?;
    Ok(format!("echo: {message}"))
  }
}

pub fn state_with(collaborator: Arc<dyn Collaborator>) -> AppState {
  AppState::from_parts(ContentStore::builtin(), collaborator, ReadingSettings::default())
}
