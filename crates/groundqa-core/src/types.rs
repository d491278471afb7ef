//! Domain types shared by the retrieval, answer and evaluation crates.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Placeholder used when a fragment carries no source path.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// A chunk of a source document as produced by ingestion.
///
/// - `id`: content-addressed chunk identifier (see [`DocumentChunk::make_id`])
/// - `source`: path of the originating file, `/`-separated
/// - `page`: 0-based page within the source, if the source is paged
/// - `topic`: corpus sub-directory the source was found in
/// - `content`: the text payload of the chunk
/// - `chunk_index`: position of the chunk within its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub source: String,
    pub page: Option<u32>,
    pub topic: Option<String>,
    pub content: String,
    pub chunk_index: usize,
}

impl DocumentChunk {
    pub fn make_id(source: &str, page: Option<u32>, chunk_index: usize, content: &str) -> ChunkId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(source.as_bytes());
        hasher.update(b"|");
        hasher.update(page.map(|p| p.to_string()).unwrap_or_default().as_bytes());
        hasher.update(b"|");
        hasher.update(chunk_index.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(content.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// One retrieved unit of evidence.
///
/// Metadata may be missing when the index was written by another tool; the
/// citation summary degrades gracefully in that case. `score` is higher-is-better
/// relevance to the query and is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: ChunkId,
    pub content: String,
    pub source: Option<String>,
    pub page: Option<u32>,
    pub topic: Option<String>,
    pub score: f32,
}

impl Fragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self { id: String::new(), content: content.into(), source: None, page: None, topic: None, score: 0.0 }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// 1-based page number for display.
    pub fn display_page(&self) -> Option<u32> {
        self.page.map(|p| p.saturating_add(1))
    }
}

impl From<DocumentChunk> for Fragment {
    fn from(chunk: DocumentChunk) -> Self {
        Self { id: chunk.id, content: chunk.content, source: Some(chunk.source), page: chunk.page, topic: chunk.topic, score: 0.0 }
    }
}

/// Ordered fragments returned by a single retrieval call.
pub type FragmentSet = Vec<Fragment>;

/// Outcome of answering one question.
///
/// `abstain` is true when either too few fragments were retrieved or the model
/// itself answered with the abstention sentence. `citations` is the rendered
/// source summary of `fragments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub abstain: bool,
    pub fragments: FragmentSet,
    pub citations: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_page_is_one_based_and_saturates() {
        assert_eq!(Fragment::new("x").with_page(0).display_page(), Some(1));
        assert_eq!(Fragment::new("x").with_page(u32::MAX).display_page(), Some(u32::MAX));
        assert_eq!(Fragment::new("x").display_page(), None);
    }
}
