//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::ContentStore;
use crate::debate::{DebateBoard, DebateScore};
use crate::domain::{
    AnalysisResult, ArticleSection, ChatTurn, DebateSide, FormComparison, HuntTarget,
    ReadingMode,
};
use crate::engine::EngineState;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SetMode {
        mode: ReadingMode,
    },
    Select {
        text: String,
    },
    ResetReading,
    SubmitAnswer {
        #[serde(rename = "questionId")]
        question_id: u32,
        answer: String,
    },
    CompareForms {
        concept: String,
    },
    SortArgument {
        #[serde(rename = "argumentId")]
        argument_id: String,
        side: DebateSide,
    },
    ResetDebate,
    TutorMessage {
        text: String,
    },
    TutorReset,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    ReadingState {
        reading: ReadingView,
    },
    AnswerResult(AnswerOut),
    Comparison(ComparisonOut),
    DebateState {
        debate: DebateView,
    },
    TutorReply {
        text: String,
    },
    Error {
        message: String,
    },
}

/// Engine state plus the values a view derives from it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingView {
    pub mode: ReadingMode,
    pub selection: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub analysis_pending: bool,
    pub found_signposts: Vec<String>,
    pub signpost_count: usize,
    pub skim_mastered: bool,
    pub hunt_cursor: usize,
    pub hunt_total: usize,
    pub hunt_target: Option<HuntTarget>,
    pub hunt_just_matched: bool,
    pub hunt_complete: bool,
}

impl ReadingView {
    pub fn new(s: &EngineState, content: &ContentStore) -> Self {
        let signpost_count = content.signposts.len();
        let hunt_total = content.hunt_targets.len();
        Self {
            mode: s.mode,
            selection: s.selection.clone(),
            analysis: s.analysis.clone(),
            analysis_pending: s.analysis_pending,
            found_signposts: s.found_signposts.clone(),
            signpost_count,
            skim_mastered: s.skim_mastered(signpost_count),
            hunt_cursor: s.hunt_cursor,
            hunt_total,
            hunt_target: content.hunt_targets.get(s.hunt_cursor).cloned(),
            hunt_just_matched: s.hunt_just_matched,
            hunt_complete: s.hunt_complete(hunt_total),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateView {
    pub placements: BTreeMap<String, DebateSide>,
    #[serde(flatten)]
    pub score: DebateScore,
    pub all_sorted: bool,
}

impl DebateView {
    pub fn new(board: &DebateBoard, content: &ContentStore) -> Self {
        Self {
            placements: board.placements().clone(),
            score: board.score(content),
            all_sorted: board.all_sorted(content),
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ArticleOut {
    pub title: String,
    pub sections: Vec<ArticleSection>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesOut {
    pub signposts: Vec<String>,
    pub skimming_tips: Vec<String>,
    pub hunt_targets: Vec<HuntTarget>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
    pub question_id: u32,
    pub answer: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub question_id: u32,
    pub is_correct: bool,
    pub feedback: String,
}

#[derive(Deserialize)]
pub struct CompareIn {
    pub concept: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComparisonOut {
    pub concept: String,
    #[serde(flatten)]
    pub comparison: FormComparison,
}

/// Debate arguments without their answer key.
#[derive(Serialize)]
pub struct ArgumentOut {
    pub id: String,
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateOut {
    pub arguments: Vec<ArgumentOut>,
    pub preset_concepts: Vec<String>,
}

#[derive(Deserialize)]
pub struct DebateScoreIn {
    #[serde(default)]
    pub placements: BTreeMap<String, DebateSide>,
}

#[derive(Deserialize)]
pub struct TutorIn {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub text: String,
}

#[derive(Serialize)]
pub struct TutorOut {
    pub text: String,
}

#[derive(Deserialize)]
pub struct PinyinIn {
    pub text: String,
}

#[derive(Serialize)]
pub struct PinyinOut {
    pub pinyin: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_parse_from_tagged_json() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"set_mode","mode":"hunt"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SetMode { mode: ReadingMode::Hunt }));

        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"submit_answer","questionId":3,"answer":"跟着别人做"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SubmitAnswer { question_id: 3, .. }));

        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"sort_argument","argumentId":"a1","side":"anti"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SortArgument { side: DebateSide::Anti, .. }));

        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"set_mode","mode":"scan"}"#).is_err());
    }

    #[test]
    fn reading_view_serializes_derived_fields() {
        let content = ContentStore::builtin();
        let state = EngineState::new(ReadingMode::Hunt);
        let msg = ServerWsMessage::ReadingState { reading: ReadingView::new(&state, &content) };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "reading_state");
        assert_eq!(v["reading"]["mode"], "hunt");
        assert_eq!(v["reading"]["huntTotal"], 5);
        assert_eq!(v["reading"]["huntTarget"]["term"], "效率");
        assert_eq!(v["reading"]["skimMastered"], false);
        assert_eq!(v["reading"]["analysis"], json!(null));
    }

    #[test]
    fn answer_result_is_flat() {
        let msg = ServerWsMessage::AnswerResult(AnswerOut {
            question_id: 2,
            is_correct: false,
            feedback: "Error checking answer.".into(),
        });
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, json!({"type": "answer_result", "questionId": 2, "isCorrect": false, "feedback": "Error checking answer."}));
    }
}
