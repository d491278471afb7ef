//! Builds the concrete pipeline components from settings.

use std::path::Path;
use std::sync::Arc;

use groundqa_answer::{BaselineAnswerer, GroundedAnswerer};
use groundqa_core::config::Settings;
use groundqa_core::traits::{Embedder, FragmentRetriever, LanguageModel};
use groundqa_embed::get_default_embedder;
use groundqa_llm::OpenAiChatModel;
use groundqa_vector::LanceRetriever;

pub fn embedder(settings: &Settings) -> Arc<dyn Embedder> {
    Arc::from(get_default_embedder(&settings.model))
}

pub fn retriever(settings: &Settings, base: &Path, embedder: Arc<dyn Embedder>) -> Arc<dyn FragmentRetriever> {
    Arc::new(LanceRetriever::new(
        settings.data.lancedb_dir(base),
        &settings.data.table,
        embedder,
        settings.retrieval.clone(),
    ))
}

pub fn chat_model(settings: &Settings) -> Arc<dyn LanguageModel> {
    Arc::new(OpenAiChatModel::new(&settings.model))
}

pub fn grounded(settings: &Settings, retriever: Arc<dyn FragmentRetriever>, model: Arc<dyn LanguageModel>) -> GroundedAnswerer {
    GroundedAnswerer::new(retriever, model, settings.retrieval.min_docs, settings.answer.clone())
}

pub fn baseline(settings: &Settings, model: Arc<dyn LanguageModel>) -> BaselineAnswerer {
    BaselineAnswerer::new(model, settings.answer.clone())
}
