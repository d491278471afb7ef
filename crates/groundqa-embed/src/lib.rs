//! Embedding providers.
//!
//! `OpenAiEmbedder` talks to any OpenAI-compatible `/embeddings` endpoint.
//! `APP_USE_FAKE_EMBEDDINGS=1` switches to the deterministic `FakeEmbedder` for
//! fast offline runs in tests and development.

use anyhow::{anyhow, Result};
use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;

use groundqa_core::config::ModelSettings;
use groundqa_core::traits::Embedder;
use groundqa_llm::openai_client;

pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dim: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(settings: &ModelSettings) -> Self {
        Self {
            client: openai_client(settings.api_base.as_deref()),
            model: settings.embed_model.clone(),
            dim: settings.embed_dim,
            id: format!("openai:{}:d{}", settings.embed_model, settings.embed_dim),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(vec![]); }
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(texts.to_vec())
            .build()?;
        let mut response = self.client.embeddings().create(request).await?;
        if response.data.len() != texts.len() {
            return Err(anyhow!("embedder returned {} vectors for {} inputs", response.data.len(), texts.len()));
        }
        response.data.sort_by_key(|e| e.index);
        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|e| e.embedding).collect();
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(anyhow!("dim mismatch: got {} expected {}", v.len(), self.dim));
        }
        tracing::debug!(model = %self.model, count = vectors.len(), "embedded batch");
        Ok(vectors)
    }
}

/// Hashing bag-of-words embedder: identical inputs give identical unit vectors
/// and texts sharing words point in similar directions.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake:xxhash:d{dim}") } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = usize::try_from(h % self.dim as u64).unwrap_or(0);
            v[idx] += 1.0 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn get_default_embedder(settings: &ModelSettings) -> Box<dyn Embedder> {
    if use_fake_embeddings() {
        tracing::info!("Using FakeEmbedder");
        return Box::new(FakeEmbedder::new(settings.embed_dim));
    }
    Box::new(OpenAiEmbedder::new(settings))
}
