use anyhow::{anyhow, Result};
use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, Int64Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;
use std::path::PathBuf;
use std::sync::Arc;

use groundqa_core::config::RetrievalSettings;
use groundqa_core::traits::{Embedder, FragmentRetriever};
use groundqa_core::types::{Fragment, FragmentSet};

use crate::mmr::mmr_select;
use crate::table::{open_db, table_exists};

/// Over-fetches `fetch_k` nearest neighbours by cosine distance and narrows
/// them to `k` with MMR. A missing index directory, missing table or empty
/// table yields an empty set instead of an error.
pub struct LanceRetriever {
	db_path: PathBuf,
	table_name: String,
	embedder: Arc<dyn Embedder>,
	params: RetrievalSettings,
}

struct Candidate {
	fragment: Fragment,
	vector: Vec<f32>,
}

impl LanceRetriever {
	pub fn new(db_path: PathBuf, table_name: &str, embedder: Arc<dyn Embedder>, params: RetrievalSettings) -> Self {
		Self { db_path, table_name: table_name.to_string(), embedder, params }
	}

	async fn nearest(&self, query_vec: &[f32]) -> Result<Vec<Candidate>> {
		if !self.db_path.exists() {
			tracing::warn!(path = %self.db_path.display(), "index directory does not exist; run ingest first");
			return Ok(vec![]);
		}
		let db = open_db(&self.db_path).await?;
		if !table_exists(&db, &self.table_name).await? {
			tracing::warn!(table = %self.table_name, "index table does not exist; run ingest first");
			return Ok(vec![]);
		}
		let table = db.open_table(&self.table_name).execute().await?;
		if table.count_rows(None).await? == 0 {
			tracing::warn!(table = %self.table_name, "index table is empty");
			return Ok(vec![]);
		}
		let mut stream = table
			.vector_search(query_vec.to_vec())?
			.distance_type(DistanceType::Cosine)
			.limit(self.params.fetch_k)
			.execute()
			.await?;
		let mut candidates = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			candidates.extend(batch_to_candidates(&batch)?);
		}
		Ok(candidates)
	}
}

#[async_trait]
impl FragmentRetriever for LanceRetriever {
	async fn retrieve(&self, query: &str) -> Result<FragmentSet> {
		let query_vec = self
			.embedder
			.embed_batch(&[query.to_string()])
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
		let mut candidates = self.nearest(&query_vec).await?;
		let vectors: Vec<Vec<f32>> = candidates.iter_mut().map(|c| std::mem::take(&mut c.vector)).collect();
		let order = mmr_select(&query_vec, &vectors, self.params.k, self.params.lambda_mult);
		let mut slots: Vec<Option<Fragment>> = candidates.into_iter().map(|c| Some(c.fragment)).collect();
		let fragments: FragmentSet = order.into_iter().filter_map(|i| slots.get_mut(i).and_then(Option::take)).collect();
		tracing::debug!(candidates = vectors.len(), selected = fragments.len(), "retrieved fragments");
		Ok(fragments)
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>())
}

fn string_at(col: Option<&StringArray>, i: usize) -> Option<String> {
	col.filter(|c| c.is_valid(i)).map(|c| c.value(i).to_string())
}

fn page_at(batch: &RecordBatch, i: usize) -> Option<u32> {
	let col = batch.column_by_name("page")?;
	if !col.is_valid(i) {
		return None;
	}
	if let Some(a) = col.as_any().downcast_ref::<Int32Array>() {
		return u32::try_from(a.value(i)).ok();
	}
	col.as_any().downcast_ref::<Int64Array>().and_then(|a| u32::try_from(a.value(i)).ok())
}

fn batch_to_candidates(batch: &RecordBatch) -> Result<Vec<Candidate>> {
	let ids = string_column(batch, "id");
	let contents = string_column(batch, "content").ok_or_else(|| anyhow!("index table has no content column"))?;
	let sources = string_column(batch, "source");
	let topics = string_column(batch, "topic");
	let vectors = batch
		.column_by_name("vector")
		.and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
		.ok_or_else(|| anyhow!("index table has no vector column"))?;
	let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());

	let mut out = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		if !vectors.is_valid(i) {
			continue;
		}
		let vector = vectors
			.value(i)
			.as_primitive_opt::<arrow_array::types::Float32Type>()
			.map(|v| v.values().to_vec())
			.ok_or_else(|| anyhow!("vector column is not float32"))?;
		let fragment = Fragment {
			id: string_at(ids, i).unwrap_or_default(),
			content: contents.value(i).to_string(),
			source: string_at(sources, i),
			page: page_at(batch, i),
			topic: string_at(topics, i),
			score: distances.map_or(0.0, |d| 1.0 - d.value(i)),
		};
		out.push(Candidate { fragment, vector });
	}
	Ok(out)
}
