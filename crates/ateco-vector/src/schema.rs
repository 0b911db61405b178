use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow schema for the corpus table. The vector width is a property of the
/// chosen embedding model, so the dimension is a parameter rather than a
/// constant.
pub fn build_arrow_schema(embedding_dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("code", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("description", DataType::Utf8, false),
        Field::new("activity", DataType::Utf8, true),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), embedding_dim),
            true,
        ),
    ]))
}
