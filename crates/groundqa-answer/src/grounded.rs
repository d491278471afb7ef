//! Retrieval-grounded answering with abstention.
//!
//! A question moves through three typed stages:
//! `Retrieved` → `Verdict` → [`AnswerResult`]. Too little evidence short-circuits
//! to the abstention sentence without calling the model; otherwise the model is
//! called exactly once and its reply is checked for a verbatim abstention.

use std::sync::Arc;

use groundqa_core::citations::summarize;
use groundqa_core::config::AnswerSettings;
use groundqa_core::traits::{FragmentRetriever, LanguageModel};
use groundqa_core::types::{AnswerResult, FragmentSet};
use groundqa_core::{Error, Result};

use crate::prompt::{build_context, grounded_prompt};

/// True only when the trimmed reply is exactly the abstention sentence.
pub fn is_abstention(answer: &str, abstention_text: &str) -> bool {
    answer.trim() == abstention_text
}

struct Retrieved {
    fragments: FragmentSet,
}

enum Verdict {
    Abstain(FragmentSet),
    Generate(FragmentSet),
}

impl Retrieved {
    fn evaluate(self, min_docs: usize) -> Verdict {
        if self.fragments.len() < min_docs {
            Verdict::Abstain(self.fragments)
        } else {
            Verdict::Generate(self.fragments)
        }
    }
}

pub struct GroundedAnswerer {
    retriever: Arc<dyn FragmentRetriever>,
    model: Arc<dyn LanguageModel>,
    min_docs: usize,
    settings: AnswerSettings,
}

impl GroundedAnswerer {
    pub fn new(retriever: Arc<dyn FragmentRetriever>, model: Arc<dyn LanguageModel>, min_docs: usize, settings: AnswerSettings) -> Self {
        Self { retriever, model, min_docs, settings }
    }

    pub async fn answer(&self, question: &str) -> Result<AnswerResult> {
        let retrieved = self.retrieve(question).await?;
        match retrieved.evaluate(self.min_docs) {
            Verdict::Abstain(fragments) => {
                tracing::info!(found = fragments.len(), min_docs = self.min_docs, "too few fragments, abstaining");
                Ok(finish(self.settings.abstention_text.clone(), true, fragments))
            }
            Verdict::Generate(fragments) => {
                let answer = self.generate(question, &fragments).await?;
                let abstain = is_abstention(&answer, &self.settings.abstention_text);
                if abstain {
                    tracing::info!("model abstained");
                }
                Ok(finish(answer, abstain, fragments))
            }
        }
    }

    async fn retrieve(&self, question: &str) -> Result<Retrieved> {
        let fragments = self.retriever.retrieve(question).await.map_err(Error::Retrieval)?;
        tracing::debug!(fragments = fragments.len(), "retrieved");
        Ok(Retrieved { fragments })
    }

    async fn generate(&self, question: &str, fragments: &FragmentSet) -> Result<String> {
        let prompt = grounded_prompt(&self.settings, &build_context(fragments), question);
        tracing::debug!(model = self.model.model_id(), prompt_chars = prompt.len(), "generating grounded answer");
        self.model.complete(&prompt).await.map_err(Error::LanguageModel)
    }
}

fn finish(answer: String, abstain: bool, fragments: FragmentSet) -> AnswerResult {
    let citations = summarize(&fragments);
    AnswerResult { answer, abstain, fragments, citations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstention_match_ignores_surrounding_whitespace_only() {
        let s = "Ich weiß es nicht auf Basis der vorliegenden Quellen.";
        assert!(is_abstention(s, s));
        assert!(is_abstention(&format!("  {s}\n"), s));
        assert!(!is_abstention(&format!("{s} Mehr Details fehlen."), s));
        assert!(!is_abstention("Ich weiß es nicht auf Basis der vorliegenden Quellen", s));
        assert!(!is_abstention("ich weiß es nicht auf basis der vorliegenden quellen.", s));
    }

    #[test]
    fn verdict_uses_min_docs_threshold() {
        use groundqa_core::types::Fragment;
        let one = Retrieved { fragments: vec![Fragment::new("a")] };
        assert!(matches!(one.evaluate(2), Verdict::Abstain(f) if f.len() == 1));
        let two = Retrieved { fragments: vec![Fragment::new("a"), Fragment::new("b")] };
        assert!(matches!(two.evaluate(2), Verdict::Generate(_)));
    }
}
