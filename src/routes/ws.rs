//! WebSocket upgrade + session loop.
//!
//! Each connection is one reader's view: it owns a selection engine, a debate
//! board and a tutor transcript. Client messages are parsed as JSON and handled
//! in order; engine changes (late analysis results, the hunt timer) and results
//! of spawned model calls are pushed as they happen.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, instrument, Instrument};
use uuid::Uuid;

use crate::debate::DebateBoard;
use crate::domain::ChatTurn;
use crate::engine::SelectionEngine;
use crate::logic::{compare_character_forms, grade_quiz_answer, tutor_reply, TUTOR_GREETING};
use crate::protocol::{AnswerOut, ClientWsMessage, ComparisonOut, DebateView, ReadingView, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let session_id = Uuid::new_v4();
  info!(target: "jianhua_backend", %session_id, "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| {
    handle_ws(socket, state).instrument(info_span!("ws_session", %session_id))
  })
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "jianhua_backend", "WebSocket connected");
  let (outbox, mut inbox) = mpsc::unbounded_channel();
  let mut session = Session::new(state, outbox);
  let mut reading_rx = session.engine.subscribe();

  let hello = [session.reading_state(), session.debate_state()];
  for msg in &hello {
    if send_json(&mut socket, msg).await.is_err() {
      return;
    }
  }

  loop {
    let outgoing = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "jianhua_backend", "WS received: {:?}", &msg);
            session.handle(msg)
          }
          Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
        },
        Some(Ok(Message::Close(_))) | None => break,
        Some(Err(e)) => {
          error!(target: "jianhua_backend", error = %e, "WS receive error");
          break;
        }
        // Pings are answered by the socket itself.
        Some(Ok(_)) => None,
      },
      changed = reading_rx.changed() => {
        if changed.is_err() {
          break;
        }
        let reading = {
          let s = reading_rx.borrow_and_update();
          ReadingView::new(&s, &session.state.content)
        };
        Some(ServerWsMessage::ReadingState { reading })
      }
      Some(msg) = inbox.recv() => Some(msg),
      Some(_) = session.tasks.join_next() => None,
    };

    if let Some(msg) = outgoing {
      if let Err(e) = send_json(&mut socket, &msg).await {
        error!(target: "jianhua_backend", error = %e, "WS send error");
        break;
      }
    }
  }
  info!(target: "jianhua_backend", "WebSocket disconnected");
}

async fn send_json(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await
}

/// Per-connection state. Model calls run on `tasks` and report through `outbox`;
/// dropping the session aborts whatever is still running.
struct Session {
  state: Arc<AppState>,
  engine: SelectionEngine,
  debate: DebateBoard,
  tutor: Arc<Mutex<Vec<ChatTurn>>>,
  outbox: mpsc::UnboundedSender<ServerWsMessage>,
  tasks: JoinSet<()>,
}

impl Session {
  fn new(state: Arc<AppState>, outbox: mpsc::UnboundedSender<ServerWsMessage>) -> Self {
    Self {
      engine: state.selection_engine(),
      state,
      debate: DebateBoard::default(),
      tutor: Arc::new(Mutex::new(vec![ChatTurn::model(TUTOR_GREETING)])),
      outbox,
      tasks: JoinSet::new(),
    }
  }

  fn reading_state(&self) -> ServerWsMessage {
    ServerWsMessage::ReadingState { reading: ReadingView::new(&self.engine.snapshot(), &self.state.content) }
  }

  fn debate_state(&self) -> ServerWsMessage {
    ServerWsMessage::DebateState { debate: DebateView::new(&self.debate, &self.state.content) }
  }

  /// Handle one client message. Returns an immediate reply, if any.
  fn handle(&mut self, msg: ClientWsMessage) -> Option<ServerWsMessage> {
    match msg {
      ClientWsMessage::Ping => Some(ServerWsMessage::Pong),

      // Reading changes reach the client through the engine's watch channel.
      ClientWsMessage::SetMode { mode } => {
        self.engine.set_mode(mode);
        None
      }
      ClientWsMessage::Select { text } => {
        self.engine.handle_selection(&text);
        None
      }
      ClientWsMessage::ResetReading => {
        self.engine.reset();
        None
      }

      ClientWsMessage::SubmitAnswer { question_id, answer } => {
        let state = self.state.clone();
        let outbox = self.outbox.clone();
        self.tasks.spawn(async move {
          let reply = match grade_quiz_answer(&state, question_id, &answer).await {
            Ok(fb) => {
              info!(target: "quiz", id = question_id, is_correct = fb.grade.is_correct, "WS answer graded");
              ServerWsMessage::AnswerResult(AnswerOut {
                question_id,
                is_correct: fb.grade.is_correct,
                feedback: fb.grade.feedback,
              })
            }
            Err(e) => ServerWsMessage::Error { message: e.to_string() },
          };
          let _ = outbox.send(reply);
        });
        None
      }

      ClientWsMessage::CompareForms { concept } => {
        let concept = concept.trim().to_string();
        if concept.is_empty() {
          return Some(ServerWsMessage::Error { message: "concept is empty".into() });
        }
        let state = self.state.clone();
        let outbox = self.outbox.clone();
        self.tasks.spawn(async move {
          if let Some(comparison) = compare_character_forms(&state, &concept).await {
            let _ = outbox.send(ServerWsMessage::Comparison(ComparisonOut { concept, comparison }));
          }
        });
        None
      }

      ClientWsMessage::SortArgument { argument_id, side } => {
        match self.debate.sort(&self.state.content, &argument_id, side) {
          Ok(()) => Some(self.debate_state()),
          Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
        }
      }
      ClientWsMessage::ResetDebate => {
        self.debate.reset();
        Some(self.debate_state())
      }

      ClientWsMessage::TutorMessage { text } => {
        let text = text.trim().to_string();
        if text.is_empty() {
          return Some(ServerWsMessage::Error { message: "message is empty".into() });
        }
        let state = self.state.clone();
        let outbox = self.outbox.clone();
        let transcript = self.tutor.clone();
        // Holding the transcript lock for the whole call keeps turns in order.
        self.tasks.spawn(async move {
          let mut turns = transcript.lock().await;
          let reply = tutor_reply(&state, &turns, &text).await;
          turns.push(ChatTurn::user(text));
          turns.push(ChatTurn::model(reply.clone()));
          let _ = outbox.send(ServerWsMessage::TutorReply { text: reply });
        });
        None
      }
      ClientWsMessage::TutorReset => {
        let outbox = self.outbox.clone();
        let transcript = self.tutor.clone();
        self.tasks.spawn(async move {
          let mut turns = transcript.lock().await;
          turns.clear();
          turns.push(ChatTurn::model(TUTOR_GREETING));
          let _ = outbox.send(ServerWsMessage::TutorReply { text: TUTOR_GREETING.into() });
        });
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ChatRole, DebateSide, ReadingMode};
  use crate::testing::{state_with, FakeCollaborator, Outcome};

  fn session(outcome: Outcome) -> (Session, mpsc::UnboundedReceiver<ServerWsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(state_with(Arc::new(FakeCollaborator::failing(outcome))));
    (Session::new(state, tx), rx)
  }

  #[tokio::test]
  async fn quiz_answers_arrive_through_the_outbox() {
    let (mut s, mut rx) = session(Outcome::Ok);
    assert!(s.handle(ClientWsMessage::SubmitAnswer { question_id: 5, answer: "刻字".into() }).is_none());
    match rx.recv().await {
      Some(ServerWsMessage::AnswerResult(out)) => {
        assert_eq!(out.question_id, 5);
        assert!(out.is_correct);
      }
      other => panic!("unexpected {:?}", other),
    }

    s.handle(ClientWsMessage::SubmitAnswer { question_id: 77, answer: "x".into() });
    assert!(matches!(rx.recv().await, Some(ServerWsMessage::Error { .. })));
  }

  #[tokio::test]
  async fn debate_updates_are_immediate() {
    let (mut s, _rx) = session(Outcome::Ok);
    let reply = s.handle(ClientWsMessage::SortArgument { argument_id: "a4".into(), side: DebateSide::Pro });
    match reply {
      Some(ServerWsMessage::DebateState { debate }) => {
        assert_eq!(debate.score.score, 1);
        assert!(!debate.all_sorted);
      }
      other => panic!("unexpected {:?}", other),
    }
    let reply = s.handle(ClientWsMessage::SortArgument { argument_id: "nope".into(), side: DebateSide::Pro });
    assert!(matches!(reply, Some(ServerWsMessage::Error { .. })));
  }

  #[tokio::test]
  async fn tutor_transcript_records_replies_and_apologies() {
    let (mut s, mut rx) = session(Outcome::Transport);
    s.handle(ClientWsMessage::TutorMessage { text: "什么是象形？".into() });
    match rx.recv().await {
      Some(ServerWsMessage::TutorReply { text }) => assert_eq!(text, crate::logic::TUTOR_APOLOGY),
      other => panic!("unexpected {:?}", other),
    }
    let turns = s.tutor.lock().await.clone();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].text, TUTOR_GREETING);
    assert_eq!(turns[1].role, ChatRole::User);
    assert_eq!(turns[2].role, ChatRole::Model);

    s.handle(ClientWsMessage::TutorReset);
    rx.recv().await;
    assert_eq!(s.tutor.lock().await.len(), 1);
  }

  #[tokio::test]
  async fn reading_commands_publish_on_the_watch_channel() {
    let (mut s, _rx) = session(Outcome::Ok);
    let mut reading = s.engine.subscribe();
    assert!(s.handle(ClientWsMessage::SetMode { mode: ReadingMode::Skim }).is_none());
    assert!(reading.has_changed().unwrap());
    s.handle(ClientWsMessage::Select { text: "综上所述".into() });
    assert_eq!(reading.borrow_and_update().found_signposts, ["综上所述"]);
  }

  #[tokio::test]
  async fn empty_inputs_are_rejected_immediately() {
    let (mut s, _rx) = session(Outcome::Ok);
    assert!(matches!(s.handle(ClientWsMessage::CompareForms { concept: " ".into() }), Some(ServerWsMessage::Error { .. })));
    assert!(matches!(s.handle(ClientWsMessage::TutorMessage { text: "".into() }), Some(ServerWsMessage::Error { .. })));
  }
}
