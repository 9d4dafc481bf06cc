use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// One row per chunk: its position in the shared chunk list, its id and its vector.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("row", DataType::Int32, false),
		Field::new("chunk_id", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
