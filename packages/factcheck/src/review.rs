//! Human review progress: the persisted state of reviewers grading runs.
//!
//! Progress files map a statement index to the reviewer's evaluation of the
//! pipeline's verdict for that statement. Files come from outside the
//! process, so loading is lenient: entries that fail to parse are skipped
//! and reported while the rest are kept.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use crate::error::{FactCheckError, Result};

/// A reviewer's agreement with the pipeline's verdict and reasoning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Agreement {
    #[serde(rename = "STRONGLY AGREE")]
    StronglyAgree,
    #[serde(rename = "AGREE")]
    Agree,
    #[serde(rename = "DISAGREE")]
    Disagree,
    #[serde(rename = "STRONGLY DISAGREE")]
    StronglyDisagree,
}

impl Agreement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StronglyAgree => "STRONGLY AGREE",
            Self::Agree => "AGREE",
            Self::Disagree => "DISAGREE",
            Self::StronglyDisagree => "STRONGLY DISAGREE",
        }
    }

    pub fn is_disagreement(&self) -> bool {
        matches!(self, Self::Disagree | Self::StronglyDisagree)
    }
}

impl fmt::Display for Agreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a reviewer disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisagreeReason {
    #[serde(rename = "IRRELEVANT/INCORRECT EVIDENCE RETRIEVED")]
    IrrelevantEvidence,
    #[serde(rename = "INCORRECT ANALYSIS OF RETRIEVED EVIDENCE")]
    IncorrectAnalysis,
}

/// One reviewed statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub evaluator: String,

    /// Model whose runs were reviewed
    pub model: String,

    /// When the review was recorded
    pub date: String,

    pub num_samples: u32,
    pub seed: u64,
    pub statement_index: usize,
    pub statement: String,

    /// Reference label from the dataset
    pub gold_verdict: String,

    pub overall_verdict: String,
    pub overall_confidence: f64,
    pub overall_reasoning: String,

    /// The reviewer's agreement with the verdict
    pub llm_evaluation: Agreement,

    #[serde(default)]
    pub disagree_reasons: Vec<DisagreeReason>,

    #[serde(default)]
    pub comments: String,
}

/// An entry that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub key: String,
    pub reason: String,
}

/// Result of loading a progress file.
#[derive(Debug, Clone, Default)]
pub struct ProgressLoad {
    /// Valid entries by statement index
    pub entries: BTreeMap<usize, ReviewEntry>,

    /// Entries that were skipped, in file order
    pub skipped: Vec<SkippedEntry>,
}

impl ProgressLoad {
    /// Merge loaded entries over existing progress; loaded entries win.
    pub fn merge_into(self, progress: &mut BTreeMap<usize, ReviewEntry>) {
        progress.extend(self.entries);
    }

    /// Count of entries per agreement level.
    pub fn agreement_counts(&self) -> BTreeMap<Agreement, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.llm_evaluation).or_default() += 1;
        }
        counts
    }
}

/// Parse a progress file.
///
/// Fails with [`FactCheckError::MalformedState`] only when the document is
/// not a JSON object at all; individual bad entries are skipped.
pub fn load_progress(json: &str) -> Result<ProgressLoad> {
    // Keyed in file order; anything other than an object is rejected here
    let map: IndexMap<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| FactCheckError::MalformedState {
            reason: format!("progress must be a JSON object keyed by statement index: {e}"),
        })?;

    let mut load = ProgressLoad::default();
    for (key, raw) in map {
        match parse_entry(&key, raw) {
            Ok((index, entry)) => {
                load.entries.insert(index, entry);
            }
            Err(reason) => {
                warn!(key = %key, reason = %reason, "Skipping malformed review entry");
                load.skipped.push(SkippedEntry { key, reason });
            }
        }
    }

    Ok(load)
}

fn parse_entry(
    key: &str,
    raw: serde_json::Value,
) -> std::result::Result<(usize, ReviewEntry), String> {
    let index: usize = key
        .trim()
        .parse()
        .map_err(|_| format!("key {:?} is not a statement index", key))?;

    let entry: ReviewEntry = serde_json::from_value(raw).map_err(|e| e.to_string())?;

    if entry.statement_index != index {
        return Err(format!(
            "key {} does not match statement_index {}",
            index, entry.statement_index
        ));
    }

    Ok((index, entry))
}

/// Serialize progress in the same shape `load_progress` reads.
pub fn save_progress(progress: &BTreeMap<usize, ReviewEntry>) -> Result<String> {
    let keyed: BTreeMap<String, &ReviewEntry> = progress
        .iter()
        .map(|(index, entry)| (index.to_string(), entry))
        .collect();
    Ok(serde_json::to_string_pretty(&keyed)?)
}
