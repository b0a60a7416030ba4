//! Configuration types for retrieval and the pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FactCheckError, Result};

/// How the document store treats a document it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Skip documents whose identity (content + url) is already stored.
    #[default]
    Identity,

    /// Store every document, duplicates included.
    None,
}

/// Configuration for the hybrid retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Identifier of the embedding model the index expects.
    ///
    /// When set, a run is rejected unless the embedder reports the same
    /// model. `None` accepts whatever the embedder runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    /// Fusion weight for the lexical score (0.0 to 1.0).
    ///
    /// The remaining weight goes to semantic similarity.
    /// Default: 0.5.
    pub lexical_weight: f32,

    /// Documents returned per query when the caller does not say.
    ///
    /// Default: 10.
    pub top_k: usize,

    /// Duplicate handling on insert.
    #[serde(default)]
    pub dedup: DedupPolicy,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            embedding_model: None,
            lexical_weight: 0.5,
            top_k: 10,
            dedup: DedupPolicy::Identity,
        }
    }
}

impl RetrieverConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding model identifier.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Set the lexical fusion weight.
    pub fn with_lexical_weight(mut self, weight: f32) -> Self {
        self.lexical_weight = weight;
        self
    }

    /// Set the default top-k.
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    /// Set the dedup policy.
    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.lexical_weight) {
            return Err(FactCheckError::Config(format!(
                "lexical_weight must be in [0, 1], got {}",
                self.lexical_weight
            )));
        }
        if self.top_k == 0 {
            return Err(FactCheckError::Config("top_k must be positive".to_string()));
        }
        Ok(())
    }

    /// Check that an embedder runs the configured model.
    pub fn check_embedder(&self, model: &str) -> Result<()> {
        match &self.embedding_model {
            Some(expected) if expected != model => Err(FactCheckError::Config(format!(
                "embedding_model is {:?} but the embedder runs {:?}",
                expected, model
            ))),
            _ => Ok(()),
        }
    }
}

/// Retry and timeout policy for external operator calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,

    /// Deadline per attempt (None = wait indefinitely).
    #[serde(default, with = "option_duration_millis")]
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            call_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no delay or timeout.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            call_timeout: None,
        }
    }

    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base backoff delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the per-attempt deadline.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Sentence-preserving chunking of long evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk.
    pub max_chunk_size: usize,

    /// Maximum characters carried over from the previous chunk.
    pub max_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            max_overlap: 200,
        }
    }
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retriever settings
    pub retriever: RetrieverConfig,

    /// Operator retry policy
    pub retry: RetryPolicy,

    /// Acquire web evidence when a searcher is configured.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub web_search: bool,

    /// Chunk context documents and acquired excerpts before indexing.
    #[serde(default)]
    pub chunking: Option<ChunkConfig>,
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retriever: RetrieverConfig::default(),
            retry: RetryPolicy::default(),
            web_search: true,
            chunking: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retriever config.
    pub fn with_retriever(mut self, retriever: RetrieverConfig) -> Self {
        self.retriever = retriever;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable web evidence acquisition.
    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    /// Enable chunking.
    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = Some(chunking);
        self
    }

    /// Check all nested settings.
    pub fn validate(&self) -> Result<()> {
        self.retriever.validate()?;
        if self.retry.max_attempts == 0 {
            return Err(FactCheckError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(chunking) = &self.chunking {
            if chunking.max_chunk_size == 0 || chunking.max_overlap >= chunking.max_chunk_size {
                return Err(FactCheckError::Config(
                    "chunking requires 0 <= max_overlap < max_chunk_size".to_string(),
                ));
            }
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

mod option_duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
