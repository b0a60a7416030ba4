//! Testing utilities including mock implementations.
//!
//! These let applications exercise the pipeline without real LLM, embedding
//! or network calls. Mocks are deterministic and record their calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{FactCheckError, Result};
use crate::pipeline::lexical::tokenize;
use crate::traits::{ai::FactCheckAI, embedder::Embedder};
use crate::types::{
    answer::{AnswerDraft, Citation},
    claim::{Claim, Evaluation, Question, Verdict},
    document::Document,
};

/// The five operator roles, for scripting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    ExtractClaims,
    GenerateQuestions,
    SynthesizeAnswer,
    EvaluateClaim,
    EvaluateStatement,
}

/// Record of a call made to the mock AI.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAICall {
    ExtractClaims { statement: String },
    GenerateQuestions { claim: String },
    SynthesizeAnswer { question: String, document_count: usize },
    EvaluateClaim { claim: String, answered: bool },
    EvaluateStatement { claim_count: usize },
}

/// A mock operator implementation for testing.
///
/// Scripted responses are keyed by the operator's input (statement, claim
/// text or question). Anything unscripted gets a deterministic default:
/// one claim equal to the statement, one question per claim searching for
/// the claim text, answers citing the first retrieved document, and
/// verdicts derived from whether evidence was cited.
#[derive(Default)]
pub struct MockAI {
    /// Predefined claims by statement
    claims: Arc<RwLock<HashMap<String, Vec<String>>>>,

    /// Predefined questions by claim text
    questions: Arc<RwLock<HashMap<String, Vec<Question>>>>,

    /// Predefined answers by question
    answers: Arc<RwLock<HashMap<String, AnswerDraft>>>,

    /// Predefined evaluations by claim text
    evaluations: Arc<RwLock<HashMap<String, Evaluation>>>,

    /// Predefined overall evaluation
    overall: Arc<RwLock<Option<Evaluation>>>,

    /// Remaining injected failures per operation
    failures: Arc<RwLock<HashMap<MockOperation, u32>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockAICall>>>,
}

impl MockAI {
    /// Create a new mock AI with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add predefined claims for a (framed) statement.
    pub fn with_claims(self, statement: impl Into<String>, claims: Vec<&str>) -> Self {
        self.claims.write().unwrap().insert(
            statement.into(),
            claims.into_iter().map(String::from).collect(),
        );
        self
    }

    /// Add predefined questions for a claim.
    pub fn with_questions(self, claim: impl Into<String>, questions: Vec<Question>) -> Self {
        self.questions.write().unwrap().insert(claim.into(), questions);
        self
    }

    /// Add a predefined answer for a question.
    pub fn with_answer(self, question: impl Into<String>, answer: AnswerDraft) -> Self {
        self.answers.write().unwrap().insert(question.into(), answer);
        self
    }

    /// Add a predefined evaluation for a claim.
    pub fn with_evaluation(self, claim: impl Into<String>, evaluation: Evaluation) -> Self {
        self.evaluations
            .write()
            .unwrap()
            .insert(claim.into(), evaluation);
        self
    }

    /// Set the overall evaluation.
    pub fn with_overall(self, evaluation: Evaluation) -> Self {
        *self.overall.write().unwrap() = Some(evaluation);
        self
    }

    /// Make the next `times` calls to an operation fail with a retryable error.
    pub fn failing(self, operation: MockOperation, times: u32) -> Self {
        self.failures.write().unwrap().insert(operation, times);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockAICall> {
        self.calls.read().unwrap().clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn record(&self, call: MockAICall) {
        self.calls.write().unwrap().push(call);
    }

    fn maybe_fail(&self, operation: MockOperation) -> Result<()> {
        let mut failures = self.failures.write().unwrap();
        match failures.get_mut(&operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(FactCheckError::InvalidResponse {
                    reason: format!("injected {:?} failure", operation),
                })
            }
            _ => Ok(()),
        }
    }

    fn default_answer(question: &Question, documents: &[Document]) -> AnswerDraft {
        let Some(first) = documents.first() else {
            return AnswerDraft::insufficient_evidence();
        };

        let snippet: String = first.content.chars().take(120).collect();
        AnswerDraft::new(format!(
            "{} The retrieved evidence states: {}\nReasoning: answered from {} document(s).",
            question.question,
            snippet,
            documents.len()
        ))
        .with_citation(Citation::from_document(first, snippet))
    }

    fn default_evaluation(claim: &Claim) -> Evaluation {
        let cited = claim
            .components()
            .iter()
            .filter_map(|c| c.answer.as_ref())
            .any(|a| !a.citations.is_empty());

        let (verdict, confidence, reasoning) = if cited {
            (Verdict::True, 0.8, "Cited evidence supports the claim.")
        } else {
            (Verdict::Unverifiable, 0.5, "No evidence was found for the claim.")
        };

        Evaluation {
            verdict,
            confidence: crate::types::claim::Confidence::new(confidence)
                .unwrap_or_default(),
            reasoning: reasoning.to_string(),
        }
    }

    fn default_overall(claims: &[Claim]) -> Evaluation {
        let verdicts: Vec<Verdict> = claims.iter().filter_map(Claim::verdict).collect();
        let verdict = if verdicts.contains(&Verdict::False) {
            Verdict::False
        } else if !verdicts.is_empty() && verdicts.iter().all(|v| *v == Verdict::True) {
            Verdict::True
        } else {
            Verdict::Unverifiable
        };

        let confidence = claims
            .iter()
            .filter_map(Claim::confidence)
            .min_by(|a, b| a.value().total_cmp(&b.value()))
            .unwrap_or_default();

        Evaluation {
            verdict,
            confidence,
            reasoning: format!("Combined {} claim verdict(s).", verdicts.len()),
        }
    }
}

#[async_trait]
impl FactCheckAI for MockAI {
    async fn extract_claims(&self, statement: &str) -> Result<Vec<String>> {
        self.record(MockAICall::ExtractClaims {
            statement: statement.to_string(),
        });
        self.maybe_fail(MockOperation::ExtractClaims)?;

        Ok(self
            .claims
            .read()
            .unwrap()
            .get(statement)
            .cloned()
            .unwrap_or_else(|| vec![statement.to_string()]))
    }

    async fn generate_questions(&self, _statement: &str, claim: &Claim) -> Result<Vec<Question>> {
        self.record(MockAICall::GenerateQuestions {
            claim: claim.text.clone(),
        });
        self.maybe_fail(MockOperation::GenerateQuestions)?;

        Ok(self
            .questions
            .read()
            .unwrap()
            .get(&claim.text)
            .cloned()
            .unwrap_or_else(|| {
                vec![Question::new(
                    format!("Is it true that {}?", claim.text),
                    [claim.text.clone()],
                )]
            }))
    }

    async fn synthesize_answer(
        &self,
        question: &Question,
        documents: &[Document],
    ) -> Result<AnswerDraft> {
        self.record(MockAICall::SynthesizeAnswer {
            question: question.question.clone(),
            document_count: documents.len(),
        });
        self.maybe_fail(MockOperation::SynthesizeAnswer)?;

        Ok(self
            .answers
            .read()
            .unwrap()
            .get(&question.question)
            .cloned()
            .unwrap_or_else(|| Self::default_answer(question, documents)))
    }

    async fn evaluate_claim(&self, claim: &Claim) -> Result<Evaluation> {
        self.record(MockAICall::EvaluateClaim {
            claim: claim.text.clone(),
            answered: claim.is_fully_answered(),
        });
        self.maybe_fail(MockOperation::EvaluateClaim)?;

        Ok(self
            .evaluations
            .read()
            .unwrap()
            .get(&claim.text)
            .cloned()
            .unwrap_or_else(|| Self::default_evaluation(claim)))
    }

    async fn evaluate_statement(&self, _statement: &str, claims: &[Claim]) -> Result<Evaluation> {
        self.record(MockAICall::EvaluateStatement {
            claim_count: claims.len(),
        });
        self.maybe_fail(MockOperation::EvaluateStatement)?;

        Ok(self
            .overall
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Self::default_overall(claims)))
    }
}

/// A deterministic embedder for testing.
///
/// Text is embedded as a hashed bag of words: every token increments one of
/// `dim` buckets chosen by its SHA-256 hash. Texts sharing words therefore
/// have positive cosine similarity. Fixed vectors can be set per text.
/// Blank input is rejected.
pub struct MockEmbedder {
    model: String,
    dim: usize,
    fixed: Arc<RwLock<HashMap<String, Vec<f32>>>>,
    failing: Arc<RwLock<bool>>,
    calls: Arc<RwLock<usize>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            model: "mock-bag-of-words".to_string(),
            dim: 256,
            fixed: Arc::default(),
            failing: Arc::default(),
            calls: Arc::default(),
        }
    }

    /// Set the reported model name.
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding dimension.
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim.max(1);
        self
    }

    /// Add a predefined embedding for text.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.fixed.write().unwrap().insert(text.into(), embedding);
        self
    }

    /// Make every call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write().unwrap() = failing;
    }

    /// Number of texts embedded so far.
    pub fn call_count(&self) -> usize {
        *self.calls.read().unwrap()
    }

    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let mut vector = vec![0.0; self.dim];
        for token in tokenize(text) {
            let hash = Sha256::digest(token.as_bytes());
            let bucket = u64::from_le_bytes([
                hash[0], hash[1], hash[2], hash[3], hash[4], hash[5], hash[6], hash[7],
            ]) as usize
                % self.dim;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        *self.calls.write().unwrap() += 1;

        if *self.failing.read().unwrap() {
            return Err(FactCheckError::Embedding("mock embedder unavailable".into()));
        }
        if text.trim().is_empty() {
            return Err(FactCheckError::Embedding("input must not be empty".into()));
        }

        Ok(self
            .fixed
            .read()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.bag_of_words(text)))
    }
}
