//! Language-model operator implementations.
//!
//! The pipeline only depends on [`crate::traits::ai::FactCheckAI`] and
//! [`crate::traits::embedder::Embedder`]; this module provides a reference
//! OpenAI-compatible implementation of both.

mod openai;
pub mod prompts;
pub mod schema;

pub use openai::OpenAI;
pub use schema::StructuredOutput;
