use std::path::Path;

use groundqa_core::{Error, Result};

pub const DEFAULT_QUESTIONS: [&str; 10] = [
    "Welche gesundheitlichen Effekte hat regelmäßige körperliche Aktivität?",
    "Was ist der Schlüssel in der Prävention und Behandlung von Typ-2-Diabetes?",
    "Schädigt Kreatin die Nieren?",
    "Welche Rolle spielt Ernährung bei der Prävention kardiovaskulärer Erkrankungen?",
    "Wie beeinflusst Schlaf die psychische Gesundheit?",
    "Welche Effekte haben Ausdauer- und Krafttraining auf die Körperzusammensetzung?",
    "Sind Low-Carb-Diäten mit der Sterblichkeit assoziiert?",
    "Welche Faktoren beeinflussen die Adhärenz an gesundheitsfördernde Verhaltensweisen?",
    "Was sind häufige Missverständnisse bei Protein-Supplementen?",
    "Welche Bedeutung hat Lebensstilmodifikation in der kardiovaskulären Prävention?",
];

/// Questions from a file (one per non-blank line), or the built-in set.
pub fn load_questions(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect());
    };
    if !path.exists() {
        return Err(Error::NotFound(format!("question file {}", path.display())));
    }
    let questions: Vec<String> = std::fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if questions.is_empty() {
        return Err(Error::InvalidConfig(format!("question file {} contains no questions", path.display())));
    }
    Ok(questions)
}
