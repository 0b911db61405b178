pub mod schema;
pub mod search;
pub mod writer;

pub use search::CorpusSearcher;
pub use writer::CorpusWriter;
