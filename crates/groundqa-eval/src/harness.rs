use groundqa_answer::{BaselineAnswerer, GroundedAnswerer};
use groundqa_core::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct EvalRow {
    pub question: String,
    pub rag_answer: String,
    pub rag_abstain: bool,
    pub rag_sources: String,
    pub no_rag_answer: String,
    pub no_rag_abstain: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalReport {
    pub rows: Vec<EvalRow>,
    pub rag_abstentions: usize,
    pub no_rag_abstentions: usize,
}

impl EvalReport {
    pub fn total(&self) -> usize { self.rows.len() }
}

/// Answer every question with both paths, one after the other. The first
/// failure aborts the whole run.
pub async fn run_evaluation(grounded: &GroundedAnswerer, baseline: &BaselineAnswerer, questions: &[String]) -> Result<EvalReport> {
    let mut report = EvalReport::default();
    for (i, question) in questions.iter().enumerate() {
        tracing::info!("Question {}/{}: {}", i + 1, questions.len(), question);
        let rag = grounded.answer(question).await?;
        let no_rag_answer = baseline.answer(question).await?.trim().to_string();
        let no_rag_abstain = baseline.abstains(&no_rag_answer);

        report.rag_abstentions += usize::from(rag.abstain);
        report.no_rag_abstentions += usize::from(no_rag_abstain);
        report.rows.push(EvalRow {
            question: question.clone(),
            rag_answer: rag.answer.trim().to_string(),
            rag_abstain: rag.abstain,
            rag_sources: rag.citations,
            no_rag_answer,
            no_rag_abstain,
        });
    }
    tracing::info!(rag = report.rag_abstentions, no_rag = report.no_rag_abstentions, total = report.total(), "evaluation finished");
    Ok(report)
}
