//! Selection engine: turns text selections into reading-activity state.
//!
//! `EngineState` holds the pure transitions; `SelectionEngine` drives them for
//! one view, running the analysis call and the hunt-advance timer as tasks and
//! publishing every change on a `watch` channel.
//!
//! Deferred work carries a ticket (reset generation plus request number or hunt
//! cursor). A result whose ticket no longer matches is dropped, so a late
//! analysis or a timer that outlived a reset cannot touch newer state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::collaborator::Collaborator;
use crate::config::ReadingSettings;
use crate::content::ContentStore;
use crate::domain::{AnalysisResult, ReadingMode};
use crate::error::CollaboratorError;
use crate::logic::analysis_placeholder;
use crate::util::trunc_for_log;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
  pub mode: ReadingMode,
  pub selection: Option<String>,
  pub analysis: Option<AnalysisResult>,
  pub analysis_pending: bool,
  /// Signposts in the order they were found. Only used in skim mode.
  pub found_signposts: Vec<String>,
  pub hunt_cursor: usize,
  pub hunt_just_matched: bool,
  #[serde(skip)]
  generation: u64,
  #[serde(skip)]
  latest_request: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalysisTicket {
  generation: u64,
  request: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HuntTicket {
  generation: u64,
  cursor: usize,
}

/// What a selection did to the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionEffect {
  /// Empty or whitespace-only; state untouched.
  Discarded,
  AnalysisRequested { ticket: AnalysisTicket, text: String },
  SignpostFound,
  HuntMatched(HuntTicket),
  NoMatch,
}

impl EngineState {
  pub fn new(mode: ReadingMode) -> Self {
    Self { mode, ..Self::default() }
  }

  /// Hard reset of all activity-local state, even when `mode` is unchanged.
  pub fn switch_mode(&mut self, mode: ReadingMode) {
    *self = Self {
      mode,
      generation: self.generation + 1,
      latest_request: self.latest_request,
      ..Self::default()
    };
  }

  pub fn select(&mut self, raw: &str, content: &ContentStore) -> SelectionEffect {
    let text = raw.trim();
    if text.is_empty() {
      return SelectionEffect::Discarded;
    }
    self.selection = Some(text.to_string());

    match self.mode {
      ReadingMode::Deep => {
        self.analysis = None;
        self.analysis_pending = true;
        self.latest_request += 1;
        let ticket = AnalysisTicket { generation: self.generation, request: self.latest_request };
        SelectionEffect::AnalysisRequested { ticket, text: text.to_string() }
      }
      ReadingMode::Skim => {
        if content.is_signpost(text) && !self.found_signposts.iter().any(|s| s == text) {
          self.found_signposts.push(text.to_string());
          SelectionEffect::SignpostFound
        } else {
          SelectionEffect::NoMatch
        }
      }
      ReadingMode::Hunt => {
        // A shown match (pending advance, or the finished hunt) ignores further hits.
        if self.hunt_just_matched {
          return SelectionEffect::NoMatch;
        }
        match content.hunt_targets.get(self.hunt_cursor) {
          Some(target) if target.term == text => {
            self.hunt_just_matched = true;
            SelectionEffect::HuntMatched(HuntTicket { generation: self.generation, cursor: self.hunt_cursor })
          }
          _ => SelectionEffect::NoMatch,
        }
      }
    }
  }

  /// Apply an analysis result if it answers the latest request of this generation.
  pub fn complete_analysis(&mut self, ticket: AnalysisTicket, result: AnalysisResult) -> bool {
    if ticket.generation != self.generation || ticket.request != self.latest_request || !self.analysis_pending {
      return false;
    }
    self.analysis = Some(result);
    self.analysis_pending = false;
    true
  }

  /// Timer callback: move past a shown match unless it was the last target.
  pub fn advance_hunt(&mut self, ticket: HuntTicket, total: usize) -> bool {
    if ticket.generation != self.generation || ticket.cursor != self.hunt_cursor || !self.hunt_just_matched {
      return false;
    }
    if self.hunt_cursor + 1 < total {
      self.hunt_cursor += 1;
      self.hunt_just_matched = false;
      true
    } else {
      false
    }
  }

  pub fn skim_mastered(&self, signpost_count: usize) -> bool {
    signpost_count > 0 && self.found_signposts.len() == signpost_count
  }

  pub fn hunt_complete(&self, total: usize) -> bool {
    self.hunt_just_matched && self.hunt_cursor + 1 == total
  }
}

/// Owns the reading state of one view. Must be used inside a tokio runtime.
pub struct SelectionEngine {
  content: Arc<ContentStore>,
  collaborator: Arc<dyn Collaborator>,
  settings: ReadingSettings,
  state: Arc<watch::Sender<EngineState>>,
  analysis_task: Option<JoinHandle<()>>,
  hunt_timer: Option<JoinHandle<()>>,
}

impl SelectionEngine {
  pub fn new(content: Arc<ContentStore>, collaborator: Arc<dyn Collaborator>, settings: ReadingSettings) -> Self {
    let (tx, _rx) = watch::channel(EngineState::new(ReadingMode::Deep));
    Self {
      content,
      collaborator,
      settings,
      state: Arc::new(tx),
      analysis_task: None,
      hunt_timer: None,
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<EngineState> {
    self.state.subscribe()
  }

  pub fn snapshot(&self) -> EngineState {
    self.state.borrow().clone()
  }

  #[cfg(test)]
  pub fn content(&self) -> &ContentStore {
    &self.content
  }

  #[instrument(level = "debug", skip(self), target = "reading")]
  pub fn set_mode(&mut self, mode: ReadingMode) {
    self.cancel_pending();
    self.state.send_modify(|s| s.switch_mode(mode));
    info!(target: "reading", ?mode, "Reading mode set; activity state reset");
  }

  /// Clear activity progress, keeping the current mode.
  pub fn reset(&mut self) {
    let mode = self.state.borrow().mode;
    self.set_mode(mode);
  }

  #[instrument(level = "debug", skip(self, raw), target = "reading", fields(preview = %trunc_for_log(raw.trim(), 12)))]
  pub fn handle_selection(&mut self, raw: &str) {
    let content = self.content.clone();
    let mut effect = SelectionEffect::Discarded;
    self.state.send_if_modified(|s| {
      effect = s.select(raw, &content);
      effect != SelectionEffect::Discarded
    });

    match effect {
      SelectionEffect::Discarded => {}
      SelectionEffect::AnalysisRequested { ticket, text } => self.spawn_analysis(ticket, text),
      SelectionEffect::SignpostFound => {
        let found = self.state.borrow().found_signposts.len();
        info!(target: "reading", found, total = content.signposts.len(), "Signpost found");
      }
      SelectionEffect::HuntMatched(ticket) => {
        info!(target: "reading", cursor = ticket.cursor, "Hunt target matched");
        self.spawn_hunt_timer(ticket);
      }
      SelectionEffect::NoMatch => debug!(target: "reading", "Selection matched nothing"),
    }
  }

  fn spawn_analysis(&mut self, ticket: AnalysisTicket, text: String) {
    let state = self.state.clone();
    let collaborator = self.collaborator.clone();
    let timeout = self.settings.analysis_timeout();

    let handle = tokio::spawn(async move {
      let result = match tokio::time::timeout(timeout, collaborator.analyze_fragment(&text)).await {
        Ok(Ok(r)) => r,
        Ok(Err(e)) => {
          warn!(target: "reading", error = %e, "Analysis failed; showing placeholder");
          analysis_placeholder(&text, &e)
        }
        Err(_) => {
          warn!(target: "reading", ?timeout, "Analysis timed out; showing placeholder");
          analysis_placeholder(&text, &CollaboratorError::Timeout)
        }
      };
      if !state.send_if_modified(|s| s.complete_analysis(ticket, result)) {
        debug!(target: "reading", "Discarded superseded analysis result");
      }
    });

    if let Some(prev) = self.analysis_task.replace(handle) {
      prev.abort();
    }
  }

  fn spawn_hunt_timer(&mut self, ticket: HuntTicket) {
    let state = self.state.clone();
    let total = self.content.hunt_targets.len();
    let delay = self.settings.hunt_advance_delay();

    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      if state.send_if_modified(|s| s.advance_hunt(ticket, total)) {
        debug!(target: "reading", cursor = ticket.cursor + 1, "Hunt advanced");
      }
    });

    if let Some(prev) = self.hunt_timer.replace(handle) {
      prev.abort();
    }
  }

  fn cancel_pending(&mut self) {
    if let Some(h) = self.analysis_task.take() {
      h.abort();
    }
    if let Some(h) = self.hunt_timer.take() {
      h.abort();
    }
  }
}

impl Drop for SelectionEngine {
  fn drop(&mut self) {
    self.cancel_pending();
  }
}
