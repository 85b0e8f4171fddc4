//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Grading quiz answers against the passage
//!   - Traditional/simplified form comparison
//!   - Tutor replies
//!   - Local placeholders that stand in for any failed collaborator call

use tracing::{error, info, instrument};

use crate::domain::{AnalysisResult, ChatTurn, FormComparison, Grade};
use crate::error::{CollaboratorError, QuizError};
use crate::pinyin::to_pinyin_diacritics;
use crate::state::AppState;
use crate::util::{is_cjk, trunc_for_log};

pub const TUTOR_GREETING: &str = "Hello! I am your AI tutor. I can help you understand the text about Chinese Simplification, explain grammar points, or discuss the history of characters. What would you like to know?";
pub const TUTOR_APOLOGY: &str = "I'm having trouble connecting to the knowledge base. Please try again.";
const API_KEY_MISSING: &str = "API Key missing";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizFeedback {
  pub question_id: u32,
  pub grade: Grade,
}

#[instrument(level = "info", skip(state, answer), fields(%question_id, answer_len = answer.len()))]
pub async fn grade_quiz_answer(state: &AppState, question_id: u32, answer: &str) -> Result<QuizFeedback, QuizError> {
  let question = state
    .content
    .question(question_id)
    .ok_or(QuizError::UnknownQuestion(question_id))?;
  let answer = answer.trim();
  if answer.is_empty() {
    return Err(QuizError::EmptyAnswer);
  }

  let context = state.content.full_text();
  let grade = match state.collaborator.grade_answer(&question.question, answer, &context).await {
    Ok(g) => g,
    Err(e) => {
      error!(target: "quiz", %question_id, error = %e, "Grading failed; using placeholder.");
      grade_placeholder(&e)
    }
  };
  info!(target: "quiz", %question_id, is_correct = grade.is_correct, "Answer graded");
  Ok(QuizFeedback { question_id, grade })
}

/// Returns None for an empty concept; the caller decides how to report that.
#[instrument(level = "info", skip(state, concept), fields(concept = %trunc_for_log(concept, 20)))]
pub async fn compare_character_forms(state: &AppState, concept: &str) -> Option<FormComparison> {
  let concept = concept.trim();
  if concept.is_empty() {
    return None;
  }
  let cmp = match state.collaborator.compare_forms(concept).await {
    Ok(c) => c,
    Err(e) => {
      error!(target: "culture", error = %e, "Form comparison failed; using placeholder.");
      comparison_placeholder(&e)
    }
  };
  Some(cmp)
}

#[instrument(level = "info", skip(state, history, message), fields(history_len = history.len(), message_len = message.len()))]
pub async fn tutor_reply(state: &AppState, history: &[ChatTurn], message: &str) -> String {
  match state.collaborator.converse(history, message).await {
    Ok(t) => t,
    Err(e) => {
      error!(target: "tutor", error = %e, "Tutor reply failed; sending apology.");
      TUTOR_APOLOGY.into()
    }
  }
}

#[instrument(level = "debug", skip(text), fields(text_len = text.len()))]
pub fn do_pinyin(text: &str) -> String {
  to_pinyin_diacritics(text)
}

// -------- Local placeholders --------

/// Stand-in for a failed fragment analysis. The pinyin line is still computed
/// locally when the selection has Han characters.
pub fn analysis_placeholder(text: &str, err: &CollaboratorError) -> AnalysisResult {
  let pinyin = if text.chars().any(is_cjk) { to_pinyin_diacritics(text) } else { "Error".into() };
  let (translation, cultural_context) = match err {
    CollaboratorError::ConfigurationMissing => (API_KEY_MISSING, "Please configure your environment variable."),
    CollaboratorError::Timeout => ("Analysis timed out", "Please try again."),
    _ => ("Could not analyze", "Please try again."),
  };
  AnalysisResult { pinyin, translation: translation.into(), cultural_context: cultural_context.into() }
}

pub fn grade_placeholder(err: &CollaboratorError) -> Grade {
  let feedback = match err {
    CollaboratorError::ConfigurationMissing => API_KEY_MISSING,
    _ => "Error checking answer.",
  };
  Grade { is_correct: false, feedback: feedback.into() }
}

pub fn comparison_placeholder(err: &CollaboratorError) -> FormComparison {
  let explanation = match err {
    CollaboratorError::ConfigurationMissing => API_KEY_MISSING,
    _ => "Could not compare forms. Please try again.",
  };
  FormComparison { traditional: "?".into(), simplified: "?".into(), explanation: explanation.into() }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::testing::{state_with, FakeCollaborator, Outcome};

  #[test]
  fn analysis_placeholder_keeps_local_pinyin() {
    let p = analysis_placeholder("传承", &CollaboratorError::Transport("reset".into()));
    assert_eq!(p.pinyin, "chuán chéng");
    assert_eq!(p.translation, "Could not analyze");

    let p = analysis_placeholder("abc", &CollaboratorError::ConfigurationMissing);
    assert_eq!(p.pinyin, "Error");
    assert_eq!(p.translation, "API Key missing");
  }

  #[test]
  fn timeout_placeholder_is_distinct() {
    let p = analysis_placeholder("效率", &CollaboratorError::Timeout);
    assert_eq!(p.translation, "Analysis timed out");
  }

  #[tokio::test]
  async fn grading_passes_question_and_full_passage() {
    let fake = Arc::new(FakeCollaborator::default());
    let state = state_with(fake.clone());
    let fb = grade_quiz_answer(&state, 4, "  记录  ").await.unwrap();
    assert_eq!(fb.question_id, 4);
    assert!(fb.grade.is_correct);

    let calls = fake.grade_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "文字最初的用途是什么？");
    assert_eq!(calls[0].1, "记录");
    assert_eq!(calls[0].2, state.content.full_text());
  }

  #[tokio::test]
  async fn grading_rejects_unknown_question_and_blank_answer() {
    let state = state_with(Arc::new(FakeCollaborator::default()));
    assert_eq!(grade_quiz_answer(&state, 99, "x").await, Err(QuizError::UnknownQuestion(99)));
    assert_eq!(grade_quiz_answer(&state, 1, "   ").await, Err(QuizError::EmptyAnswer));
  }

  #[tokio::test]
  async fn grading_failure_degrades_to_placeholder() {
    let state = state_with(Arc::new(FakeCollaborator::failing(Outcome::Transport)));
    let fb = grade_quiz_answer(&state, 1, "因为缺乏美感").await.unwrap();
    assert!(!fb.grade.is_correct);
    assert_eq!(fb.grade.feedback, "Error checking answer.");

    let state = state_with(Arc::new(FakeCollaborator::failing(Outcome::Unconfigured)));
    let fb = grade_quiz_answer(&state, 1, "因为缺乏美感").await.unwrap();
    assert_eq!(fb.grade.feedback, "API Key missing");
  }

  #[tokio::test]
  async fn comparison_placeholder_and_empty_concept() {
    let state = state_with(Arc::new(FakeCollaborator::failing(Outcome::Parse)));
    assert!(compare_character_forms(&state, "  ").await.is_none());
    let cmp = compare_character_forms(&state, "Horse (Ma)").await.unwrap();
    assert_eq!(cmp.traditional, "?");
    assert_eq!(cmp.simplified, "?");
  }

  #[tokio::test]
  async fn tutor_failure_becomes_apology() {
    let state = state_with(Arc::new(FakeCollaborator::failing(Outcome::Transport)));
    assert_eq!(tutor_reply(&state, &[], "你好").await, TUTOR_APOLOGY);

    let state = state_with(Arc::new(FakeCollaborator::default()));
    assert_eq!(tutor_reply(&state, &[ChatTurn::model(TUTOR_GREETING)], "你好").await, "echo: 你好");
  }
}
