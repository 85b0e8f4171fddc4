//! Application state shared by every handler: the content store, the model
//! collaborator, and reading activity settings.
//!
//! Per-view state (selection engine, debate board, tutor transcript) lives in
//! the WebSocket session that owns it, never here.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::collaborator::{Collaborator, ModelGateway};
use crate::config::{load_agent_config_from_env, ReadingSettings};
use crate::content::ContentStore;
use crate::engine::SelectionEngine;
use crate::openai::OpenAI;

#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentStore>,
    pub collaborator: Arc<dyn Collaborator>,
    pub reading: ReadingSettings,
}

impl AppState {
    /// Build state from env: load config, built-in content, model client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();
        let content = ContentStore::builtin();
        info!(
            target: "jianhua_backend",
            sections = content.sections.len(),
            questions = content.quiz.len(),
            signposts = content.signposts.len(),
            hunt_targets = content.hunt_targets.len(),
            debate_arguments = content.debate.len(),
            "Content loaded"
        );

        let gateway = ModelGateway::new(OpenAI::from_env(), cfg.prompts);
        Self::from_parts(content, Arc::new(gateway), cfg.reading)
    }

    pub fn from_parts(
        content: ContentStore,
        collaborator: Arc<dyn Collaborator>,
        reading: ReadingSettings,
    ) -> Self {
        Self { content: Arc::new(content), collaborator, reading }
    }

    /// Fresh engine for one view, starting in deep-reading mode.
    pub fn selection_engine(&self) -> SelectionEngine {
        SelectionEngine::new(
            self.content.clone(),
            self.collaborator.clone(),
            self.reading.clone(),
        )
    }
}
