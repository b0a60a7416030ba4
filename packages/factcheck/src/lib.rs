//! Statement Verification Library
//!
//! Verifies natural-language statements by decomposing them into atomic
//! claims, generating targeted questions per claim, retrieving evidence from
//! a hybrid (lexical + semantic) index that grows as web evidence is fetched
//! during the run, synthesizing cited answers, and judging each claim and
//! the statement as a whole.
//!
//! # Design Philosophy
//!
//! - Language models are operators behind one trait; the pipeline only
//!   sequences them and threads evidence between them
//! - Every run owns its own index, discarded when the run ends
//! - Deterministic ordering everywhere: extraction order, generation order,
//!   insertion order for ranking ties
//! - Missing evidence and flaky search degrade answers, never the run
//!
//! # Usage
//!
//! ```rust,ignore
//! use factcheck::{Pipeline, PipelineConfig, Statement};
//! use factcheck::testing::{MockAI, MockEmbedder};
//!
//! let ai = Arc::new(MockAI::new());
//! let pipeline = Pipeline::new(ai, Arc::new(MockEmbedder::new()), PipelineConfig::default())
//!     .with_searcher(Arc::new(searcher));
//!
//! let statement = Statement::new("Inflation fell to 2%.")
//!     .with_originator("Org X");
//! let result = pipeline.run(&statement).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Operator, embedder and web searcher abstractions
//! - [`types`] - Statements, claims, answers, documents and configuration
//! - [`pipeline`] - Hybrid retriever, evidence acquisition and orchestration
//! - [`stores`] - Run-scoped document storage
//! - [`review`] - Loading and saving human review progress
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod pipeline;
pub mod review;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{FactCheckError, Location, Result, Stage};
pub use pipeline::{
    chunk_text, EvidenceAcquirer, HybridRetriever, Pipeline, ProgressObserver, ProgressUpdate,
};
pub use traits::{
    ai::FactCheckAI,
    embedder::Embedder,
    searcher::{MockWebSearcher, SearchResult, SerperWebSearcher, TavilyWebSearcher, WebSearcher},
};
pub use types::{
    answer::{Answer, AnswerDraft, Citation},
    claim::{Claim, ClaimComponent, Confidence, Evaluation, Question, Verdict},
    config::{ChunkConfig, DedupPolicy, PipelineConfig, RetrieverConfig, RetryPolicy},
    document::{Document, DocumentId, ScoredDocument},
    record::{PipelineResult, RunRecord},
    statement::Statement,
};
