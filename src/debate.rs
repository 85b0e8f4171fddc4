//! Debate sorting: the reader places each argument on the pro or anti side of
//! simplification and is scored against the built-in answer key.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::content::ContentStore;
use crate::domain::DebateSide;
use crate::error::DebateError;

#[derive(Clone, Debug, Default)]
pub struct DebateBoard {
  placements: BTreeMap<String, DebateSide>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateScore {
  pub score: usize,
  pub total: usize,
  pub sorted: usize,
  /// Placements naming arguments that do not exist; never counted.
  pub unknown: Vec<String>,
}

impl DebateBoard {
  /// Place (or move) an argument.
  pub fn sort(&mut self, content: &ContentStore, id: &str, side: DebateSide) -> Result<(), DebateError> {
    if content.argument(id).is_none() {
      return Err(DebateError::UnknownArgument(id.to_string()));
    }
    self.placements.insert(id.to_string(), side);
    Ok(())
  }

  pub fn reset(&mut self) {
    self.placements.clear();
  }

  pub fn placements(&self) -> &BTreeMap<String, DebateSide> {
    &self.placements
  }

  pub fn all_sorted(&self, content: &ContentStore) -> bool {
    content.debate.iter().all(|a| self.placements.contains_key(&a.id))
  }

  pub fn score(&self, content: &ContentStore) -> DebateScore {
    score_placements(content, &self.placements)
  }
}

/// Score arbitrary placements, e.g. a board submitted in one request.
pub fn score_placements(content: &ContentStore, placements: &BTreeMap<String, DebateSide>) -> DebateScore {
  let mut score = 0;
  let mut sorted = 0;
  let mut unknown = Vec::new();
  for (id, side) in placements {
    match content.argument(id) {
      Some(arg) => {
        sorted += 1;
        if arg.side == *side {
          score += 1;
        }
      }
      None => unknown.push(id.clone()),
    }
  }
  DebateScore { score, total: content.debate.len(), sorted, unknown }
}
