//! Progress reporting side channel.
//!
//! Observers are informed as the pipeline crosses stage checkpoints. They do
//! not influence the run and a dropped receiver is ignored.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::Stage;

/// A progress checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    /// Stage about to run, or `None` once the run is complete
    pub stage: Option<Stage>,

    /// Fraction of the run completed, in [0, 1]
    pub fraction: f32,

    /// Human-readable status
    pub message: String,
}

impl ProgressUpdate {
    /// Checkpoint at the start of a stage.
    pub fn starting(stage: Stage) -> Self {
        let (fraction, message) = match stage {
            Stage::ClaimExtraction => (0.1, "Extracting claims"),
            Stage::QuestionGeneration => (0.2, "Generating questions"),
            Stage::EvidenceRetrieval | Stage::AnswerSynthesis => {
                (0.4, "Retrieving evidence and answering questions")
            }
            Stage::ClaimEvaluation => (0.8, "Evaluating claims"),
            Stage::OverallEvaluation => (0.9, "Evaluating statement"),
        };
        Self {
            stage: Some(stage),
            fraction,
            message: message.to_string(),
        }
    }

    /// Final checkpoint.
    pub fn complete() -> Self {
        Self {
            stage: None,
            fraction: 1.0,
            message: "Complete".to_string(),
        }
    }
}

/// Receives progress updates.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn on_progress(&self, update: ProgressUpdate) {
        self(update)
    }
}

impl ProgressObserver for mpsc::UnboundedSender<ProgressUpdate> {
    fn on_progress(&self, update: ProgressUpdate) {
        let _ = self.send(update);
    }
}

/// Observer that ignores every update.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _update: ProgressUpdate) {}
}
