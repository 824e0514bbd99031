use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow schema for one partition table. The vector dimension comes from
/// the embedder at construction time.
pub fn build_passage_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("partition", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}
