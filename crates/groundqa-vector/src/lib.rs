//! LanceDB-backed fragment storage: ingestion writer and diversity-aware retriever.

pub mod mmr;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use search::LanceRetriever;
pub use writer::LanceFragmentWriter;
