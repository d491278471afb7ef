use async_trait::async_trait;

use crate::types::FragmentSet;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    /// Embeddings in input order; every vector has `dim()` entries.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait FragmentRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> anyhow::Result<FragmentSet>;
}

/// Stateless text completion over a fully formed prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
