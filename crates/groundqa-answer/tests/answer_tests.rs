use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use groundqa_answer::{BaselineAnswerer, GroundedAnswerer};
use groundqa_core::config::{AnswerSettings, ABSTENTION_TEXT};
use groundqa_core::traits::{FragmentRetriever, LanguageModel};
use groundqa_core::types::{Fragment, FragmentSet};
use groundqa_core::Error;

struct StaticRetriever(FragmentSet);

#[async_trait]
impl FragmentRetriever for StaticRetriever {
    async fn retrieve(&self, _query: &str) -> anyhow::Result<FragmentSet> { Ok(self.0.clone()) }
}

struct FailingRetriever;

#[async_trait]
impl FragmentRetriever for FailingRetriever {
    async fn retrieve(&self, _query: &str) -> anyhow::Result<FragmentSet> { Err(anyhow::anyhow!("index unavailable")) }
}

#[derive(Default)]
struct ScriptedModel {
    reply: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedModel {
    fn replying(reply: &str) -> Arc<Self> { Arc::new(Self { reply: Some(reply.to_string()), ..Self::default() }) }
    fn failing() -> Arc<Self> { Arc::new(Self::default()) }
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
    fn prompt(&self) -> String { self.last_prompt.lock().map(|p| p.clone().unwrap_or_default()).unwrap_or_default() }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str { "scripted" }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() { *last = Some(prompt.to_string()); }
        self.reply.clone().ok_or_else(|| anyhow::anyhow!("rate limited"))
    }
}

fn fragments(n: usize) -> FragmentSet {
    (0..n)
        .map(|i| Fragment::new(format!("Befund {i}")).with_source(format!("data/raw/sport/studie{i}.pdf")).with_page(i as u32).with_topic("sport"))
        .collect()
}

fn grounded(frags: FragmentSet, model: Arc<ScriptedModel>) -> GroundedAnswerer {
    GroundedAnswerer::new(Arc::new(StaticRetriever(frags)), model, 2, AnswerSettings::default())
}

#[tokio::test]
async fn too_few_fragments_abstain_without_model_call() -> anyhow::Result<()> {
    let model = ScriptedModel::replying("sollte nie erscheinen");
    let result = grounded(fragments(1), model.clone()).answer("Schädigt Kreatin die Nieren?").await?;
    assert!(result.abstain);
    assert_eq!(result.answer, ABSTENTION_TEXT);
    assert_eq!(result.fragments.len(), 1);
    assert_eq!(result.citations, "- data/raw/sport/studie0.pdf (topic=sport), S. 1");
    assert_eq!(model.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_retrieval_abstains_with_empty_citations() -> anyhow::Result<()> {
    let model = ScriptedModel::replying("egal");
    let result = grounded(vec![], model.clone()).answer("Was ist Vitamin D?").await?;
    assert!(result.abstain);
    assert!(result.citations.is_empty());
    assert_eq!(model.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn enough_fragments_call_model_once_with_ordered_context() -> anyhow::Result<()> {
    let model = ScriptedModel::replying("Kreatin ist für Gesunde unbedenklich.");
    let result = grounded(fragments(8), model.clone()).answer("Schädigt Kreatin die Nieren?").await?;
    assert!(!result.abstain);
    assert_eq!(result.answer, "Kreatin ist für Gesunde unbedenklich.");
    assert_eq!(result.fragments.len(), 8);
    assert_eq!(model.calls(), 1);
    let prompt = model.prompt();
    assert!(prompt.contains("Befund 0\n\nBefund 1\n\nBefund 2"));
    assert!(prompt.contains("Schädigt Kreatin die Nieren?"));
    assert_eq!(result.citations.lines().count(), 8);
    Ok(())
}

#[tokio::test]
async fn exactly_min_docs_generates() -> anyhow::Result<()> {
    let model = ScriptedModel::replying("Antwort.");
    let result = grounded(fragments(2), model.clone()).answer("Frage?").await?;
    assert!(!result.abstain);
    assert_eq!(model.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn model_abstention_is_detected_after_trimming() -> anyhow::Result<()> {
    let model = ScriptedModel::replying("  Ich weiß es nicht auf Basis der vorliegenden Quellen.\n");
    let result = grounded(fragments(3), model).answer("Frage?").await?;
    assert!(result.abstain);
    assert_eq!(result.fragments.len(), 3);
    Ok(())
}

#[tokio::test]
async fn paraphrased_abstention_is_not_an_abstention() -> anyhow::Result<()> {
    let model = ScriptedModel::replying("Dazu weiß ich leider nichts auf Basis der Quellen.");
    let result = grounded(fragments(3), model).answer("Frage?").await?;
    assert!(!result.abstain);
    Ok(())
}

#[tokio::test]
async fn model_failure_is_a_hard_error() {
    let model = ScriptedModel::failing();
    let outcome = grounded(fragments(4), model.clone()).answer("Frage?").await;
    assert!(matches!(outcome, Err(Error::LanguageModel(_))));
    assert_eq!(model.calls(), 1, "no retries");
}

#[tokio::test]
async fn retrieval_failure_is_a_hard_error() {
    let model = ScriptedModel::replying("egal");
    let answerer = GroundedAnswerer::new(Arc::new(FailingRetriever), model.clone(), 2, AnswerSettings::default());
    assert!(matches!(answerer.answer("Frage?").await, Err(Error::Retrieval(_))));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn baseline_uses_question_only_and_flags_exact_abstention() -> anyhow::Result<()> {
    let model = ScriptedModel::replying("Ich weiß es nicht.");
    let baseline = BaselineAnswerer::new(model.clone(), AnswerSettings::default());
    let answer = baseline.answer("Sind Low-Carb-Diäten mit der Sterblichkeit assoziiert?").await?;
    assert!(baseline.abstains(&answer));
    assert!(!baseline.abstains("Ich weiß es nicht genau."));
    assert!(!model.prompt().contains("Kontext"));
    assert_eq!(model.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn baseline_propagates_model_errors() {
    let baseline = BaselineAnswerer::new(ScriptedModel::failing(), AnswerSettings::default());
    assert!(matches!(baseline.answer("Frage?").await, Err(Error::LanguageModel(_))));
}
