use anyhow::{bail, Result};
use serde::Serialize;

use groundqa_core::types::AnswerResult;
use groundqa_eval::EvalReport;

pub const ABSTENTION_NOTICE: &str = "Hinweis: Keine ausreichend relevante Kontextbasis gefunden (Abstention).";

/// Trimmed question, or an error when nothing is left to ask.
pub fn normalize_question(raw: &str) -> Result<&str> {
    let q = raw.trim();
    if q.is_empty() {
        bail!("Bitte gib eine Frage ein.");
    }
    Ok(q)
}

pub fn render_answer(result: &AnswerResult) -> String {
    let mut out = format!("Antwort\n{}\n\n", result.answer.trim());
    if result.abstain {
        out.push_str(ABSTENTION_NOTICE);
    } else {
        out.push_str("Quellen\n");
        out.push_str(&result.citations);
    }
    out
}

#[derive(Serialize)]
struct JsonAnswer<'a> {
    question: &'a str,
    answer: &'a str,
    abstain: bool,
    sources: &'a str,
    fragments: usize,
}

pub fn render_json(question: &str, result: &AnswerResult) -> Result<String> {
    let view = JsonAnswer {
        question,
        answer: result.answer.trim(),
        abstain: result.abstain,
        sources: &result.citations,
        fragments: result.fragments.len(),
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

pub fn render_eval_summary(report: &EvalReport) -> String {
    format!(
        "RAG Abstentions: {}/{}\nNo-RAG Abstentions: {}/{}",
        report.rag_abstentions,
        report.total(),
        report.no_rag_abstentions,
        report.total()
    )
}
