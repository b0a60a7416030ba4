//! Language-model operators for the verification pipeline.
//!
//! The `FactCheckAI` trait abstracts the five LLM-backed stages:
//! - Claim extraction
//! - Question generation
//! - Answer synthesis
//! - Claim evaluation
//! - Overall statement evaluation

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    answer::AnswerDraft,
    claim::{Claim, Evaluation, Question},
    document::Document,
};

/// LLM operators, one method per pipeline role.
///
/// Implementations wrap specific providers and own prompting and response
/// parsing. A schema-invalid response must surface as
/// `FactCheckError::InvalidResponse` so the pipeline can retry it; retry and
/// backoff policy belong to the caller, not the implementation.
#[async_trait]
pub trait FactCheckAI: Send + Sync {
    /// Decompose a statement into atomic claims, in order.
    ///
    /// `statement` is the framed statement text (date and originator
    /// included when known).
    async fn extract_claims(&self, statement: &str) -> Result<Vec<String>>;

    /// Generate sub-questions with search queries for one claim.
    async fn generate_questions(&self, statement: &str, claim: &Claim) -> Result<Vec<Question>>;

    /// Answer a question from the retrieved documents.
    ///
    /// Must produce a well-formed answer when `documents` is empty,
    /// e.g. [`AnswerDraft::insufficient_evidence`], rather than failing.
    async fn synthesize_answer(
        &self,
        question: &Question,
        documents: &[Document],
    ) -> Result<AnswerDraft>;

    /// Judge a claim from its answered components.
    async fn evaluate_claim(&self, claim: &Claim) -> Result<Evaluation>;

    /// Judge the whole statement from its evaluated claims.
    ///
    /// Aggregation across claim verdicts is entirely up to the implementation.
    async fn evaluate_statement(&self, statement: &str, claims: &[Claim]) -> Result<Evaluation>;
}

#[async_trait]
impl<T: FactCheckAI + ?Sized> FactCheckAI for std::sync::Arc<T> {
    async fn extract_claims(&self, statement: &str) -> Result<Vec<String>> {
        (**self).extract_claims(statement).await
    }

    async fn generate_questions(&self, statement: &str, claim: &Claim) -> Result<Vec<Question>> {
        (**self).generate_questions(statement, claim).await
    }

    async fn synthesize_answer(
        &self,
        question: &Question,
        documents: &[Document],
    ) -> Result<AnswerDraft> {
        (**self).synthesize_answer(question, documents).await
    }

    async fn evaluate_claim(&self, claim: &Claim) -> Result<Evaluation> {
        (**self).evaluate_claim(claim).await
    }

    async fn evaluate_statement(&self, statement: &str, claims: &[Claim]) -> Result<Evaluation> {
        (**self).evaluate_statement(statement, claims).await
    }
}
