use anyhow::{anyhow, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::path::Path;
use std::sync::Arc;

use groundqa_core::traits::Embedder;
use groundqa_core::types::DocumentChunk;

use crate::schema::build_fragment_schema;
use crate::table::{open_db, table_exists};

/// Embeds chunks in batches and upserts them into the fragment table by id,
/// creating the table on first write.
pub struct LanceFragmentWriter {
	db: Connection,
	table_name: String,
	embedder: Arc<dyn Embedder>,
	batch_size: usize,
}

impl LanceFragmentWriter {
	pub async fn new(db_path: &Path, table_name: &str, embedder: Arc<dyn Embedder>, batch_size: usize) -> Result<Self> {
		std::fs::create_dir_all(db_path)?;
		let db = open_db(db_path).await?;
		Ok(Self { db, table_name: table_name.to_string(), embedder, batch_size: batch_size.max(1) })
	}

	pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize> {
		if chunks.is_empty() {
			tracing::warn!("no chunks to index");
			return Ok(0);
		}
		tracing::info!(chunks = chunks.len(), table = %self.table_name, embedder = self.embedder.embedder_id(), "indexing");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(
			ProgressStyle::default_bar()
				.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
				.progress_chars("#>-"),
		);
		let mut processed = 0usize;
		for batch in chunks.chunks(self.batch_size) {
			let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
			let vectors = self.embedder.embed_batch(&texts).await?;
			if vectors.len() != batch.len() {
				return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), batch.len()));
			}
			self.insert_batch(batch, vectors).await?;
			processed += batch.len();
			pb.set_position(processed as u64);
		}
		pb.finish_with_message("done");
		tracing::info!(processed, "indexing completed");
		Ok(processed)
	}

	async fn insert_batch(&self, chunks: &[DocumentChunk], vectors: Vec<Vec<f32>>) -> Result<()> {
		let record_batch = self.to_record_batch(chunks, vectors)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if table_exists(&self.db, &self.table_name).await? {
			// Chunk ids are content-addressed, so re-ingesting a file replaces its rows.
			let table = self.db.open_table(&self.table_name).execute().await?;
			let mut mi = table.merge_insert(&["id"]);
			mi.when_matched_update_all(None).when_not_matched_insert_all();
			mi.execute(reader).await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(())
	}

	fn to_record_batch(&self, chunks: &[DocumentChunk], vectors: Vec<Vec<f32>>) -> Result<RecordBatch> {
		let dim = self.embedder.dim();
		if let Some(v) = vectors.iter().find(|v| v.len() != dim) {
			return Err(anyhow!("dim mismatch: got {} expected {}", v.len(), dim));
		}
		let schema = build_fragment_schema(dim);
		let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
		let sources: Vec<Option<String>> = chunks.iter().map(|c| Some(c.source.clone())).collect();
		let pages: Vec<Option<i32>> = chunks.iter().map(|c| c.page.and_then(|p| i32::try_from(p).ok())).collect();
		let topics: Vec<Option<String>> = chunks.iter().map(|c| c.topic.clone()).collect();
		let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
		let chunk_indices: Vec<i32> = chunks.iter().map(|c| i32::try_from(c.chunk_index).unwrap_or(i32::MAX)).collect();
		let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
		let record_batch = RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(sources)),
			Arc::new(Int32Array::from(pages)),
			Arc::new(StringArray::from(topics)),
			Arc::new(StringArray::from(contents)),
			Arc::new(Int32Array::from(chunk_indices)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, i32::try_from(dim)?)),
		])?;
		Ok(record_batch)
	}
}
