//! Typed errors for the fact-checking library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! fatal stage failures apart from the conditions the pipeline degrades on.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A stage of the verification pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ClaimExtraction,
    QuestionGeneration,
    EvidenceRetrieval,
    AnswerSynthesis,
    ClaimEvaluation,
    OverallEvaluation,
}

impl Stage {
    /// Human-readable stage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ClaimExtraction => "claim extraction",
            Stage::QuestionGeneration => "question generation",
            Stage::EvidenceRetrieval => "evidence retrieval",
            Stage::AnswerSynthesis => "answer synthesis",
            Stage::ClaimEvaluation => "claim evaluation",
            Stage::OverallEvaluation => "overall evaluation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in a run a stage failure happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    /// Index of the claim being processed, if any.
    pub claim: Option<usize>,

    /// Index of the component within that claim, if any.
    pub component: Option<usize>,
}

impl Location {
    /// Location for statement-level stages.
    pub fn statement() -> Self {
        Self::default()
    }

    /// Location for a claim-level stage.
    pub fn claim(claim: usize) -> Self {
        Self {
            claim: Some(claim),
            component: None,
        }
    }

    /// Location for a component-level stage.
    pub fn component(claim: usize, component: usize) -> Self {
        Self {
            claim: Some(claim),
            component: Some(component),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.claim, self.component) {
            (Some(c), Some(q)) => write!(f, "claim {}, component {}", c, q),
            (Some(c), None) => write!(f, "claim {}", c),
            _ => f.write_str("statement"),
        }
    }
}

/// Errors that can occur while verifying a statement.
#[derive(Debug, Error)]
pub enum FactCheckError {
    /// The statement has no text to verify
    #[error("invalid statement: {reason}")]
    InvalidStatement { reason: String },

    /// Claim extraction produced nothing for a non-empty statement
    #[error("claim extraction returned no claims")]
    EmptyExtraction,

    /// An operator failed after exhausting its retry budget
    #[error("{stage} failed at {location} after {attempts} attempt(s): {source}")]
    StageFailed {
        stage: Stage,
        location: Location,
        attempts: u32,
        #[source]
        source: Box<FactCheckError>,
    },

    /// Language-model service unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Operator output did not match its schema
    #[error("invalid operator response: {reason}")]
    InvalidResponse { reason: String },

    /// External call exceeded its deadline
    #[error("external call timed out after {0:?}")]
    Timeout(Duration),

    /// Web search provider failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Run was cancelled
    #[error("run cancelled before {}", .stage.map(|s| s.as_str()).unwrap_or("completion"))]
    Cancelled { stage: Option<Stage> },

    /// Externally supplied state could not be parsed at all
    #[error("malformed external state: {reason}")]
    MalformedState { reason: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl FactCheckError {
    /// Wrap an operator error with the stage and position it failed at.
    pub fn stage_failed(stage: Stage, location: Location, attempts: u32, source: Self) -> Self {
        Self::StageFailed {
            stage,
            location,
            attempts,
            source: Box::new(source),
        }
    }

    /// The stage a fatal failure belongs to, if known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            Self::EmptyExtraction => Some(Stage::ClaimExtraction),
            Self::Cancelled { stage } => *stage,
            _ => None,
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Structural failures (empty extraction, cancellation, bad config) are
    /// not retried; transport, timeout and schema failures are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AI(_)
                | Self::InvalidResponse { .. }
                | Self::Timeout(_)
                | Self::Embedding(_)
                | Self::JsonParse(_)
        )
    }
}

/// Result type alias for fact-checking operations.
pub type Result<T> = std::result::Result<T, FactCheckError>;
