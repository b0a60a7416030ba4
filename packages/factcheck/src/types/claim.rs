//! Claims, their components, and verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::answer::Answer;
use crate::error::FactCheckError;

/// Categorical truth assessment shared by claims and statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    True,
    False,
    Unverifiable,
}

impl Verdict {
    /// All verdicts, in display order.
    pub const ALL: [Verdict; 3] = [Verdict::True, Verdict::False, Verdict::Unverifiable];

    /// Canonical upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
            Verdict::Unverifiable => "UNVERIFIABLE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = FactCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRUE" => Ok(Verdict::True),
            "FALSE" => Ok(Verdict::False),
            "UNVERIFIABLE" => Ok(Verdict::Unverifiable),
            other => Err(FactCheckError::InvalidResponse {
                reason: format!("unknown verdict: {:?}", other),
            }),
        }
    }
}

/// A confidence value in the closed unit interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Validate a raw confidence value.
    pub fn new(value: f64) -> Result<Self, FactCheckError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FactCheckError::InvalidResponse {
                reason: format!("confidence {} outside [0, 1]", value),
            })
        }
    }

    /// The raw value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = FactCheckError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Verdict, confidence and reasoning from an evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub reasoning: String,
}

impl Evaluation {
    /// Create an evaluation, validating the confidence.
    pub fn new(
        verdict: Verdict,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Result<Self, FactCheckError> {
        Ok(Self {
            verdict,
            confidence: Confidence::new(confidence)?,
            reasoning: reasoning.into(),
        })
    }
}

/// A generated question with the search queries meant to answer it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    /// The sub-question
    pub question: String,

    /// Search queries, processed in order
    pub search_queries: Vec<String>,
}

impl Question {
    /// Create a question.
    pub fn new(
        question: impl Into<String>,
        search_queries: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            question: question.into(),
            search_queries: search_queries.into_iter().map(Into::into).collect(),
        }
    }
}

/// A sub-question generated to help verify a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimComponent {
    pub question: String,

    pub search_queries: Vec<String>,

    /// Absent until answer synthesis
    #[serde(default)]
    pub answer: Option<Answer>,
}

impl From<Question> for ClaimComponent {
    fn from(q: Question) -> Self {
        Self {
            question: q.question,
            search_queries: q.search_queries,
            answer: None,
        }
    }
}

impl ClaimComponent {
    /// Whether synthesis has run for this component.
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// An atomic, independently verifiable assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClaimFields")]
pub struct Claim {
    pub text: String,

    /// Absent until question generation
    #[serde(default)]
    pub components: Option<Vec<ClaimComponent>>,

    /// Absent until claim evaluation
    #[serde(flatten)]
    pub evaluation: Option<Evaluation>,
}

/// Wire shape of a claim. The evaluation fields are all present or all
/// absent, and a present set must be valid.
#[derive(Deserialize)]
struct ClaimFields {
    text: String,
    #[serde(default)]
    components: Option<Vec<ClaimComponent>>,
    #[serde(default)]
    verdict: Option<Verdict>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

impl TryFrom<ClaimFields> for Claim {
    type Error = FactCheckError;

    fn try_from(fields: ClaimFields) -> Result<Self, Self::Error> {
        let evaluation = match (fields.verdict, fields.confidence, fields.reasoning) {
            (None, None, None) => None,
            (Some(verdict), Some(confidence), Some(reasoning)) => {
                Some(Evaluation::new(verdict, confidence, reasoning)?)
            }
            _ => {
                return Err(FactCheckError::InvalidResponse {
                    reason: format!(
                        "claim {:?} has a partial evaluation; \
                         verdict, confidence and reasoning go together",
                        fields.text
                    ),
                })
            }
        };

        Ok(Self {
            text: fields.text,
            components: fields.components,
            evaluation,
        })
    }
}

impl Claim {
    /// Create an unprocessed claim.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            components: None,
            evaluation: None,
        }
    }

    /// Components generated for this claim (empty before generation).
    pub fn components(&self) -> &[ClaimComponent] {
        self.components.as_deref().unwrap_or_default()
    }

    /// Whether every component has an answer.
    pub fn is_fully_answered(&self) -> bool {
        self.components.is_some() && self.components().iter().all(ClaimComponent::is_answered)
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.evaluation.as_ref().map(|e| e.verdict)
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.evaluation.as_ref().map(|e| e.confidence)
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.evaluation.as_ref().map(|e| e.reasoning.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_parse_is_case_insensitive() {
        assert_eq!("true".parse::<Verdict>().unwrap(), Verdict::True);
        assert_eq!(" Unverifiable ".parse::<Verdict>().unwrap(), Verdict::Unverifiable);
        assert!("MOSTLY TRUE".parse::<Verdict>().is_err());
    }

    #[test]
    fn test_verdict_serializes_upper_case() {
        let json = serde_json::to_string(&Verdict::Unverifiable).unwrap();
        assert_eq!(json, "\"UNVERIFIABLE\"");
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(1.01).is_err());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
    }

    #[test]
    fn test_confidence_rejected_on_deserialize() {
        let err = serde_json::from_str::<Confidence>("1.5");
        assert!(err.is_err());
    }

    #[test]
    fn test_claim_serialization_flattens_evaluation() {
        let mut claim = Claim::new("inflation fell to 2%");
        claim.components = Some(vec![]);
        claim.evaluation = Some(Evaluation::new(Verdict::False, 0.8, "CPI was 3.4%").unwrap());

        let value = serde_json::to_value(&claim).unwrap();
        assert_eq!(value["verdict"], "FALSE");
        assert_eq!(value["confidence"], 0.8);

        let back: Claim = serde_json::from_value(value).unwrap();
        assert_eq!(back.verdict(), Some(Verdict::False));
    }

    #[test]
    fn test_claim_with_invalid_evaluation_is_rejected() {
        use serde_json::json;

        let out_of_range =
            json!({"text": "x", "verdict": "TRUE", "confidence": 1.5, "reasoning": "r"});
        assert!(serde_json::from_value::<Claim>(out_of_range).is_err());

        let unknown_verdict =
            json!({"text": "x", "verdict": "MOSTLY", "confidence": 0.5, "reasoning": "r"});
        assert!(serde_json::from_value::<Claim>(unknown_verdict).is_err());
    }

    #[test]
    fn test_claim_with_partial_evaluation_is_rejected() {
        let missing_reasoning = r#"{"text": "x", "verdict": "TRUE", "confidence": 0.5}"#;
        assert!(serde_json::from_str::<Claim>(missing_reasoning).is_err());

        let confidence_only = r#"{"text": "x", "confidence": 0.5}"#;
        assert!(serde_json::from_str::<Claim>(confidence_only).is_err());
    }

    #[test]
    fn test_unevaluated_claim_has_no_verdict() {
        let back: Claim = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert!(back.evaluation.is_none());
        assert!(back.components.is_none());
        assert!(!back.is_fully_answered());
    }
}
