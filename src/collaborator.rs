//! The analysis collaborator seam: four fallible request/response operations
//! against a hosted model. Views and the selection engine only see this trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Prompts;
use crate::domain::{AnalysisResult, ChatTurn, FormComparison, Grade};
use crate::error::CollaboratorError;
use crate::openai::OpenAI;

#[async_trait]
pub trait Collaborator: Send + Sync {
  async fn analyze_fragment(&self, text: &str) -> Result<AnalysisResult, CollaboratorError>;

  async fn grade_answer(
    &self,
    question: &str,
    answer: &str,
    context: &str,
  ) -> Result<Grade, CollaboratorError>;

  async fn compare_forms(&self, concept: &str) -> Result<FormComparison, CollaboratorError>;

  async fn converse(&self, history: &[ChatTurn], message: &str) -> Result<String, CollaboratorError>;
}

/// Production collaborator. Without a configured client every call fails with
/// `ConfigurationMissing` before touching the network.
#[derive(Clone)]
pub struct ModelGateway {
  openai: Option<OpenAI>,
  prompts: Prompts,
}

impl ModelGateway {
  pub fn new(openai: Option<OpenAI>, prompts: Prompts) -> Self {
    match &openai {
      Some(oa) => info!(target: "jianhua_backend", base_url = %oa.base_url, model = %oa.model, "Model enabled."),
      None => warn!(target: "jianhua_backend", "Model disabled (no OPENAI_API_KEY). Collaborator calls return placeholders."),
    }
    Self { openai, prompts }
  }

  fn client(&self) -> Result<&OpenAI, CollaboratorError> {
    self.openai.as_ref().ok_or(CollaboratorError::ConfigurationMissing)
  }
}

#[async_trait]
impl Collaborator for ModelGateway {
  async fn analyze_fragment(&self, text: &str) -> Result<AnalysisResult, CollaboratorError> {
    self.client()?.analyze_fragment(&self.prompts, text).await
  }

  async fn grade_answer(
    &self,
    question: &str,
    answer: &str,
    context: &str,
  ) -> Result<Grade, CollaboratorError> {
    self.client()?.grade_answer(&self.prompts, question, answer, context).await
  }

  async fn compare_forms(&self, concept: &str) -> Result<FormComparison, CollaboratorError> {
    self.client()?.compare_forms(&self.prompts, concept).await
  }

  async fn converse(&self, history: &[ChatTurn], message: &str) -> Result<String, CollaboratorError> {
    self.client()?.converse(&self.prompts, history, message).await
  }
}
