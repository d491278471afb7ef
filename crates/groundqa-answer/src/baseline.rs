use std::sync::Arc;

use groundqa_core::config::AnswerSettings;
use groundqa_core::traits::LanguageModel;
use groundqa_core::{Error, Result};

use crate::prompt::baseline_prompt;

/// Asks the model directly without retrieved context. Used as the control
/// arm of the evaluation.
pub struct BaselineAnswerer {
    model: Arc<dyn LanguageModel>,
    settings: AnswerSettings,
}

impl BaselineAnswerer {
    pub fn new(model: Arc<dyn LanguageModel>, settings: AnswerSettings) -> Self {
        Self { model, settings }
    }

    pub async fn answer(&self, question: &str) -> Result<String> {
        let prompt = baseline_prompt(&self.settings, question);
        tracing::debug!(model = self.model.model_id(), "generating baseline answer");
        self.model.complete(&prompt).await.map_err(Error::LanguageModel)
    }

    pub fn abstains(&self, answer: &str) -> bool {
        answer.trim() == self.settings.baseline_abstention_text
    }
}
