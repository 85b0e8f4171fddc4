//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::debate::score_placements;
use crate::error::QuizError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorOut>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
  (status, Json(ErrorOut { message: message.into() }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_article(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ArticleOut { title: state.content.title.clone(), sections: state.content.sections.clone() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_activities(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ActivitiesOut {
    signposts: state.content.signposts.clone(),
    skimming_tips: state.content.skimming_tips.clone(),
    hunt_targets: state.content.hunt_targets.clone(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_quiz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.content.quiz.clone())
}

#[instrument(level = "info", skip(state, body), fields(question_id = body.question_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  match grade_quiz_answer(&state, body.question_id, &body.answer).await {
    Ok(fb) => {
      info!(target: "quiz", id = fb.question_id, is_correct = fb.grade.is_correct, "HTTP answer graded");
      Ok(Json(AnswerOut { question_id: fb.question_id, is_correct: fb.grade.is_correct, feedback: fb.grade.feedback }))
    }
    Err(e @ QuizError::UnknownQuestion(_)) => Err(api_error(StatusCode::NOT_FOUND, e.to_string())),
    Err(e @ QuizError::EmptyAnswer) => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
  }
}

#[instrument(level = "info", skip(state, body), fields(concept_len = body.concept.len()))]
pub async fn http_post_compare(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CompareIn>,
) -> Result<Json<ComparisonOut>, ApiError> {
  let concept = body.concept.trim().to_string();
  compare_character_forms(&state, &concept)
    .await
    .map(|comparison| Json(ComparisonOut { concept, comparison }))
    .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "concept is empty"))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_debate(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let arguments = state
    .content
    .debate
    .iter()
    .map(|a| ArgumentOut { id: a.id.clone(), text: a.text.clone() })
    .collect();
  Json(DebateOut { arguments, preset_concepts: state.content.preset_concepts.clone() })
}

#[instrument(level = "info", skip(state, body), fields(placements = body.placements.len()))]
pub async fn http_post_debate_score(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DebateScoreIn>,
) -> impl IntoResponse {
  let score = score_placements(&state.content, &body.placements);
  info!(target: "culture", score = score.score, total = score.total, "HTTP debate scored");
  Json(score)
}

#[instrument(level = "info", skip(state, body), fields(history_len = body.history.len(), text_len = body.text.len()))]
pub async fn http_post_tutor_message(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TutorIn>,
) -> Result<Json<TutorOut>, ApiError> {
  if body.text.trim().is_empty() {
    return Err(api_error(StatusCode::BAD_REQUEST, "message is empty"));
  }
  let text = tutor_reply(&state, &body.history, body.text.trim()).await;
  Ok(Json(TutorOut { text }))
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.len()))]
pub async fn http_post_pinyin(Json(body): Json<PinyinIn>) -> impl IntoResponse {
  Json(PinyinOut { pinyin: do_pinyin(&body.text) })
}
