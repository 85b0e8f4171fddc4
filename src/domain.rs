//! Domain models: reference content records, reading modes, and the result
//! shapes returned by the analysis collaborator.

use serde::{Deserialize, Serialize};

/// One paragraph of the reading passage. Sequence order is reading order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSection {
  pub id: String,
  pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
  pub id: u32,
  pub question: String,
}

/// A term the vocabulary hunt asks the reader to locate, with an English clue.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HuntTarget {
  pub term: String,
  pub clue: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DebateSide {
  Pro,
  Anti,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebateArgument {
  pub id: String,
  pub text: String,
  pub side: DebateSide,
}

/// Which reading activity the selection engine is driving.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReadingMode {
  /// A selection triggers a remote linguistic/cultural analysis.
  #[default]
  Deep,
  /// Locate the transition-word signposts.
  Skim,
  /// Locate one target term at a time, in order.
  Hunt,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
  pub pinyin: String,
  pub translation: String,
  pub cultural_context: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
  pub is_correct: bool,
  pub feedback: String,
}

/// Traditional vs simplified rendering of one character or concept.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormComparison {
  pub traditional: String,
  pub simplified: String,
  pub explanation: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
  User,
  Model,
}

/// One turn of the tutor conversation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
  pub role: ChatRole,
  pub text: String,
}

impl ChatTurn {
  pub fn user(text: impl Into<String>) -> Self {
    Self { role: ChatRole::User, text: text.into() }
  }

  pub fn model(text: impl Into<String>) -> Self {
    Self { role: ChatRole::Model, text: text.into() }
  }
}
