//! Statements submitted for verification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FactCheckError, Result};

/// A natural-language statement, optionally attributed and dated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// What was said
    pub text: String,

    /// When it was said
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Who said it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originator: Option<String>,
}

impl Statement {
    /// Create an undated, unattributed statement.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            date: None,
            originator: None,
        }
    }

    /// Set the date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the originator.
    pub fn with_originator(mut self, originator: impl Into<String>) -> Self {
        self.originator = Some(originator.into());
        self
    }

    /// Reject statements with no text.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(FactCheckError::InvalidStatement {
                reason: "statement text is empty".to_string(),
            });
        }
        Ok(())
    }

    /// The statement as handed to the operators.
    ///
    /// Renders `On {date}, {originator} claimed: {text}`, dropping whichever
    /// of date and originator is absent.
    pub fn framed(&self) -> String {
        let text = self.text.trim();
        match (&self.date, self.originator.as_deref()) {
            (Some(date), Some(who)) => format!("On {}, {} claimed: {}", date, who, text),
            (Some(date), None) => format!("On {}, it was claimed: {}", date, text),
            (None, Some(who)) => format!("{} claimed: {}", who, text),
            (None, None) => text.to_string(),
        }
    }
}
