//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g. `APP_RETRIEVAL__K=5`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const ABSTENTION_TEXT: &str = "Ich weiß es nicht auf Basis der vorliegenden Quellen.";
pub const BASELINE_ABSTENTION_TEXT: &str = "Ich weiß es nicht.";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::debug!(env = other, "no environment-specific config file for this RUST_ENV"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed view of the whole configuration, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub ingest: IngestSettings,
    pub model: ModelSettings,
    pub answer: AnswerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    pub raw_dir: String,
    pub lancedb_dir: String,
    pub table: String,
    pub eval_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            raw_dir: "data/raw".to_string(),
            lancedb_dir: "vectorstore/lancedb".to_string(),
            table: "documents".to_string(),
            eval_dir: "eval".to_string(),
        }
    }
}

impl DataSettings {
    pub fn raw_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.raw_dir) }
    pub fn lancedb_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.lancedb_dir) }
    pub fn eval_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.eval_dir) }
}

/// Diversity-aware retrieval parameters and the structural abstention threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Fragments returned after MMR selection.
    pub k: usize,
    /// Candidates over-fetched from the index before MMR.
    pub fetch_k: usize,
    /// 0.0 = maximum diversity, 1.0 = maximum relevance.
    pub lambda_mult: f32,
    /// Fewer fragments than this forces an abstention.
    pub min_docs: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 8, fetch_k: 30, lambda_mult: 0.5, min_docs: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 100, batch_size: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub chat_model: String,
    pub embed_model: String,
    pub embed_dim: usize,
    pub temperature: f32,
    /// OpenAI-compatible endpoint; the client default is used when unset.
    #[serde(default)]
    pub api_base: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4.1-nano".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            embed_dim: 1536,
            temperature: 0.0,
            api_base: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSettings {
    pub abstention_text: String,
    pub baseline_abstention_text: String,
    pub sentence_style: String,
    pub language: String,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            abstention_text: ABSTENTION_TEXT.to_string(),
            baseline_abstention_text: BASELINE_ABSTENTION_TEXT.to_string(),
            sentence_style: "ein bis zwei kurzen, präzisen Sätzen".to_string(),
            language: "Deutsch".to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be at least 1".into()));
        }
        if r.fetch_k < r.k {
            return Err(Error::InvalidConfig(format!("retrieval.fetch_k ({}) must be >= retrieval.k ({})", r.fetch_k, r.k)));
        }
        if !(0.0..=1.0).contains(&r.lambda_mult) {
            return Err(Error::InvalidConfig(format!("retrieval.lambda_mult must be within [0, 1], got {}", r.lambda_mult)));
        }
        let i = &self.ingest;
        if i.chunk_size == 0 || i.chunk_overlap >= i.chunk_size {
            return Err(Error::InvalidConfig(format!("ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})", i.chunk_overlap, i.chunk_size)));
        }
        if i.batch_size == 0 {
            return Err(Error::InvalidConfig("ingest.batch_size must be at least 1".into()));
        }
        if self.model.embed_dim == 0 {
            return Err(Error::InvalidConfig("model.embed_dim must be at least 1".into()));
        }
        if self.answer.abstention_text.trim().is_empty() {
            return Err(Error::InvalidConfig("answer.abstention_text must not be empty".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
