//! Retrieval engine and staged verification pipeline.

pub mod acquire;
pub mod chunk;
pub mod index;
pub mod lexical;
pub mod orchestrator;
pub mod progress;
pub mod recall;
pub mod retry;

pub use acquire::EvidenceAcquirer;
pub use chunk::chunk_text;
pub use index::HybridRetriever;
pub use orchestrator::Pipeline;
pub use progress::{NoopObserver, ProgressObserver, ProgressUpdate};
pub use retry::with_retry;
