//! Prompt templates for the grounded and the ungrounded answer paths.

use groundqa_core::config::AnswerSettings;
use groundqa_core::types::Fragment;

/// Fragment contents in retrieval order, separated by blank lines.
pub fn build_context(fragments: &[Fragment]) -> String {
    fragments.iter().map(|f| f.content.as_str()).collect::<Vec<_>>().join("\n\n")
}

pub fn grounded_prompt(settings: &AnswerSettings, context: &str, question: &str) -> String {
    format!(
        "Du bist ein wissenschaftlich vorsichtiger Assistent.\n\
         Beantworte die Frage ausschließlich anhand des bereitgestellten Kontexts.\n\
         \n\
         Regeln:\n\
         1) Wenn der Kontext nicht ausreicht, antworte exakt:\n\
         \"{abstention}\"\n\
         2) Erfinde keine Fakten oder Zahlen.\n\
         3) Antworte in {style} und auf {language}.\n\
         \n\
         Kontext:\n\
         {context}\n\
         \n\
         Frage:\n\
         {question}\n\
         \n\
         Antwort:\n",
        abstention = settings.abstention_text,
        style = settings.sentence_style,
        language = settings.language,
    )
}

pub fn baseline_prompt(settings: &AnswerSettings, question: &str) -> String {
    format!(
        "Du bist ein wissenschaftlich vorsichtiger Assistent.\n\
         Antworte in {style} und auf {language}.\n\
         \n\
         Frage:\n\
         {question}\n\
         \n\
         Antwort:\n",
        style = settings.sentence_style,
        language = settings.language,
    )
}
