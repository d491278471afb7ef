//! Corpus walking and chunking for ingestion.
//!
//! Files are read page by page (`.pdf` through the `pdftotext` binary, `.txt`
//! directly; both use form feeds as page breaks) and each page is cut into
//! overlapping character windows with a recursive separator strategy.

use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::DocumentChunk;

const PAGE_BREAK: char = '\x0c';
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 100 }
    }
}

/// Text of one page; `number` is `None` for unpaged sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: Option<u32>,
    pub text: String,
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
    source_base: Option<PathBuf>,
}

impl DataProcessor {
    pub fn new(chunking_config: ChunkingConfig) -> Self { Self { chunking_config, source_base: None } }

    /// Record chunk sources relative to `base` (e.g. `data/raw/<topic>/<file>`).
    pub fn with_source_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.source_base = Some(base.into());
        self
    }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<DocumentChunk>> {
        self.process_files(data_dir, self.list_source_files(data_dir))
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<DocumentChunk>> {
        let mut files = self.list_source_files(data_dir);
        if files.len() > limit {
            files.truncate(limit);
            tracing::info!(limit, "limited ingestion to the first files");
        }
        self.process_files(data_dir, files)
    }

    fn process_files(&self, data_dir: &Path, files: Vec<PathBuf>) -> Result<Vec<DocumentChunk>> {
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt or .pdf files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::info!("Processing file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let pages = match read_pages(file_path) {
                Ok(pages) => pages,
                Err(e) => {
                    tracing::warn!(file = %file_path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let source = relative_source(file_path, self.source_base.as_deref());
            let topic = topic_for(file_path, data_dir);
            all_chunks.extend(self.chunk_pages(&source, topic.as_deref(), &pages));
        }
        tracing::info!("Processed {} files into {} chunks", files.len(), all_chunks.len());
        Ok(all_chunks)
    }

    pub fn chunk_pages(&self, source: &str, topic: Option<&str>, pages: &[Page]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;
        for page in pages {
            for content in self.split_text(&page.text) {
                chunks.push(DocumentChunk {
                    id: DocumentChunk::make_id(source, page.number, chunk_index, &content),
                    source: source.to_string(),
                    page: page.number,
                    topic: topic.map(str::to_string),
                    content,
                    chunk_index,
                });
                chunk_index += 1;
            }
        }
        chunks
    }

    /// Split text into windows of at most `chunk_size` characters, carrying up
    /// to `chunk_overlap` characters of trailing context into the next window.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).map(str::to_string).collect()
        };

        let mut out = Vec::new();
        let mut fitting: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) <= self.chunking_config.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                out.extend(self.merge_splits(&fitting, separator));
                fitting.clear();
            }
            if remaining.is_empty() {
                out.push(piece);
            } else {
                out.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !fitting.is_empty() {
            out.extend(self.merge_splits(&fitting, separator));
        }
        out
    }

    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let size = self.chunking_config.chunk_size;
        let overlap = self.chunking_config.chunk_overlap;
        let sep_len = char_len(separator);

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;
        for split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { sep_len };
            if total + len + joiner > size && !current.is_empty() {
                push_joined(&mut docs, &current, separator);
                loop {
                    let joiner = if current.is_empty() { 0 } else { sep_len };
                    if total <= overlap && (total == 0 || total + len + joiner <= size) {
                        break;
                    }
                    let Some(first) = current.pop_front() else { break };
                    let dropped_joiner = if current.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(char_len(first) + dropped_joiner);
                }
            }
            current.push_back(split);
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }
        push_joined(&mut docs, &current, separator);
        docs
    }

    fn list_source_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| matches!(extension(p).as_deref(), Some("txt" | "pdf")))
            .collect();
        files.sort();
        files
    }
}

fn push_joined(docs: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize { s.chars().count() }

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase)
}

/// `/`-separated source path, relative to `base` when the file lies below it.
pub fn relative_source(file_path: &Path, base: Option<&Path>) -> String {
    let path = base.and_then(|b| file_path.strip_prefix(b).ok()).unwrap_or(file_path);
    path.to_string_lossy().replace('\\', "/")
}

/// Topic label: the containing directory relative to the corpus root.
pub fn topic_for(file_path: &Path, data_dir: &Path) -> Option<String> {
    let relative = file_path.strip_prefix(data_dir).unwrap_or(file_path);
    let parent = relative.parent()?;
    let topic = parent
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/");
    if topic.is_empty() { None } else { Some(topic) }
}

/// Split extracted text on form feeds. Text without form feeds is unpaged.
pub fn split_pages(text: &str) -> Vec<Page> {
    if !text.contains(PAGE_BREAK) {
        return vec![Page { number: None, text: text.to_string() }];
    }
    text.split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, t)| !t.trim().is_empty())
        .map(|(i, t)| Page { number: u32::try_from(i).ok(), text: t.to_string() })
        .collect()
}

pub fn read_pages(file_path: &Path) -> Result<Vec<Page>> {
    match extension(file_path).as_deref() {
        Some("pdf") => {
            let text = extract_pdf_text(file_path)?;
            let mut pages = split_pages(&text);
            // pdftotext always emits page breaks; a single-page PDF still has page 0
            for page in &mut pages {
                page.number.get_or_insert(0);
            }
            Ok(pages)
        }
        Some("txt") => {
            let content = match fs::read_to_string(file_path) {
                Ok(content) => content,
                Err(_) => String::from_utf8_lossy(&fs::read(file_path)?).to_string(),
            };
            Ok(split_pages(&content))
        }
        _ => Err(anyhow!("unsupported file type: {}", file_path.display())),
    }
}

fn extract_pdf_text(file_path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(file_path)
        .arg("-")
        .output()
        .context("failed to run pdftotext (is poppler-utils installed?)")?;
    if !output.status.success() {
        return Err(anyhow!(
            "pdftotext failed for {}: {}",
            file_path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(size: usize, overlap: usize) -> DataProcessor {
        DataProcessor::new(ChunkingConfig { chunk_size: size, chunk_overlap: overlap })
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(processor(500, 100).split_text("Kurzer Absatz."), vec!["Kurzer Absatz.".to_string()]);
    }

    #[test]
    fn chunks_respect_size_and_overlap() {
        let words: Vec<String> = (0..200).map(|i| format!("w{i:03}")).collect();
        let text = words.join(" ");
        let chunks = processor(50, 20).split_text(&text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 50, "chunk too long: {c}");
        }
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap_or_default();
            assert!(pair[0].contains(first_word), "expected overlap between {:?} and {:?}", pair[0], pair[1]);
        }
        assert!(chunks.last().is_some_and(|c| c.ends_with("w199")));
    }

    #[test]
    fn paragraphs_are_preferred_split_points() {
        let text = format!("{}\n\n{}", "a".repeat(30), "b".repeat(30));
        let chunks = processor(40, 0).split_text(&text);
        assert_eq!(chunks, vec!["a".repeat(30), "b".repeat(30)]);
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let chunks = processor(10, 2).split_text(&"x".repeat(25));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn form_feeds_define_zero_based_pages() {
        let pages = split_pages("eins\x0czwei\x0c\x0cvier\x0c");
        let numbers: Vec<_> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![Some(0), Some(1), Some(3)]);
    }

    #[test]
    fn text_without_form_feed_is_unpaged() {
        assert_eq!(split_pages("plain").first().and_then(|p| p.number), None);
    }

    #[test]
    fn topic_is_relative_parent_dir() {
        let root = Path::new("/corpus");
        assert_eq!(topic_for(Path::new("/corpus/ernaehrung/diabetes/a.pdf"), root).as_deref(), Some("ernaehrung/diabetes"));
        assert_eq!(topic_for(Path::new("/corpus/a.pdf"), root), None);
    }

    #[test]
    fn source_is_relative_to_base_when_possible() {
        let base = Path::new("/srv/groundqa");
        assert_eq!(relative_source(Path::new("/srv/groundqa/data/raw/a.pdf"), Some(base)), "data/raw/a.pdf");
        assert_eq!(relative_source(Path::new("/elsewhere/a.pdf"), Some(base)), "/elsewhere/a.pdf");
        assert_eq!(relative_source(Path::new("/elsewhere/a.pdf"), None), "/elsewhere/a.pdf");
    }

    #[test]
    fn chunk_ids_are_stable_and_distinct() {
        let p = processor(500, 100);
        let pages = vec![Page { number: Some(0), text: "alpha".into() }, Page { number: Some(1), text: "beta".into() }];
        let a = p.chunk_pages("doc.pdf", Some("t"), &pages);
        let b = p.chunk_pages("doc.pdf", Some("t"), &pages);
        assert_eq!(a, b);
        assert_ne!(a[0].id, a[1].id);
        assert_eq!(a[1].chunk_index, 1);
        assert_eq!(a[1].page, Some(1));
    }
}
