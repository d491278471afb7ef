use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow layout of the fragment table. Metadata columns are nullable so
/// tables written by other tools without them still read back.
pub fn build_fragment_schema(dim: usize) -> Arc<Schema> {
	let dim = i32::try_from(dim).unwrap_or(i32::MAX);
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("source", DataType::Utf8, true),
		Field::new("page", DataType::Int32, true),
		Field::new("topic", DataType::Utf8, true),
		Field::new("content", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
