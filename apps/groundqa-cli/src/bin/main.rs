use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use groundqa_cli::render::{normalize_question, render_answer, render_eval_summary, render_json};
use groundqa_cli::wiring;
use groundqa_core::config::{Config, Settings};
use groundqa_core::data_processor::{ChunkingConfig, DataProcessor};
use groundqa_eval::{load_questions, run_evaluation, write_report};
use groundqa_vector::table::remove_index_dir;
use groundqa_vector::LanceFragmentWriter;

#[derive(Parser)]
#[command(name = "groundqa", version, about = "Source-grounded question answering over a local health corpus")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Chunk, embed and index the document corpus
    Ingest {
        /// Delete the existing index before writing
        #[arg(long)]
        rebuild: bool,
        /// Only process the first N files
        #[arg(long)]
        limit: Option<usize>,
        /// Corpus directory (defaults to data.raw_dir)
        dir: Option<PathBuf>,
    },
    /// Answer one question from the indexed corpus
    Ask {
        #[arg(long)]
        json: bool,
        question: String,
    },
    /// Compare grounded and ungrounded answers over the question set
    Eval {
        /// One question per line instead of the built-in set
        #[arg(long)]
        questions: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let base = std::env::current_dir()?;
    tracing::debug!(base = %base.display(), table = %settings.data.table, "configuration loaded");

    match cli.cmd {
        Cmd::Ingest { rebuild, limit, dir } => ingest(&settings, &base, rebuild, limit, dir).await,
        Cmd::Ask { json, question } => ask(&settings, &base, &question, json).await,
        Cmd::Eval { questions, out_dir } => eval(&settings, &base, questions.as_deref(), out_dir).await,
    }
}

async fn ingest(settings: &Settings, base: &Path, rebuild: bool, limit: Option<usize>, dir: Option<PathBuf>) -> Result<()> {
    let data_dir = dir.unwrap_or_else(|| settings.data.raw_dir(base));
    let lancedb_path = settings.data.lancedb_dir(base);
    println!("Ingesting from {}", data_dir.display());
    if rebuild && remove_index_dir(&lancedb_path)? {
        println!("Removed existing index at {}", lancedb_path.display());
    }

    let processor = DataProcessor::new(ChunkingConfig {
        chunk_size: settings.ingest.chunk_size,
        chunk_overlap: settings.ingest.chunk_overlap,
    })
    .with_source_base(base);
    let chunks = match limit {
        Some(limit) => processor.process_directory_limited(&data_dir, limit)?,
        None => processor.process_directory(&data_dir)?,
    };

    let embedder = wiring::embedder(settings);
    let writer = LanceFragmentWriter::new(&lancedb_path, &settings.data.table, embedder, settings.ingest.batch_size).await?;
    let indexed = writer.index_chunks(&chunks).await?;
    println!("Ingestion abgeschlossen: {} chunks in {}", indexed, lancedb_path.display());
    Ok(())
}

async fn ask(settings: &Settings, base: &Path, question: &str, json: bool) -> Result<()> {
    let question = normalize_question(question)?;
    let retriever = wiring::retriever(settings, base, wiring::embedder(settings));
    let answerer = wiring::grounded(settings, retriever, wiring::chat_model(settings));
    let result = answerer.answer(question).await?;
    if json {
        println!("{}", render_json(question, &result)?);
    } else {
        println!("{}", render_answer(&result));
    }
    Ok(())
}

async fn eval(settings: &Settings, base: &Path, questions: Option<&Path>, out_dir: Option<PathBuf>) -> Result<()> {
    let questions = load_questions(questions)?;
    let model = wiring::chat_model(settings);
    let retriever = wiring::retriever(settings, base, wiring::embedder(settings));
    let grounded = wiring::grounded(settings, retriever, model.clone());
    let baseline = wiring::baseline(settings, model);

    let report = run_evaluation(&grounded, &baseline, &questions).await?;
    let out_dir = out_dir.unwrap_or_else(|| settings.data.eval_dir(base));
    let path = write_report(&report, &out_dir, &chrono::Local::now())?;
    println!("CSV geschrieben: {}", path.display());
    println!("{}", render_eval_summary(&report));
    Ok(())
}
