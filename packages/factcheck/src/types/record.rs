//! Pipeline outputs and the persisted per-statement record.

use serde::{Deserialize, Serialize};

use super::claim::{Claim, Confidence, Evaluation, Verdict};
use super::statement::Statement;

/// The outcome of one pipeline run over a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub reasoning: String,

    /// Evaluated claims, in extraction order
    pub claims: Vec<Claim>,
}

impl PipelineResult {
    /// Assemble a result from the overall evaluation and evaluated claims.
    pub fn new(evaluation: Evaluation, claims: Vec<Claim>) -> Self {
        Self {
            verdict: evaluation.verdict,
            confidence: evaluation.confidence,
            reasoning: evaluation.reasoning,
            claims,
        }
    }

    /// Total explicit citations across all answered components.
    pub fn citation_count(&self) -> usize {
        self.claims
            .iter()
            .flat_map(|c| c.components())
            .filter_map(|comp| comp.answer.as_ref())
            .map(|a| a.citations.len())
            .sum()
    }
}

/// A persisted record per evaluated statement, consumed by review tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub statement: Statement,

    /// The chosen verdict for the statement
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub reasoning: String,

    /// Evaluated claims with components, answers and citations
    pub claims: Vec<Claim>,
}

impl RunRecord {
    /// Record a single run.
    pub fn from_result(statement: Statement, result: PipelineResult) -> Self {
        Self {
            statement,
            verdict: result.verdict,
            confidence: result.confidence,
            reasoning: result.reasoning,
            claims: result.claims,
        }
    }

    /// Record the first of several passes whose verdict matches `chosen`.
    ///
    /// Returns `None` when no pass reached the chosen verdict.
    pub fn from_passes(
        statement: Statement,
        passes: impl IntoIterator<Item = PipelineResult>,
        chosen: Verdict,
    ) -> Option<Self> {
        passes
            .into_iter()
            .find(|r| r.verdict == chosen)
            .map(|r| Self::from_result(statement, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::answer::{Answer, AnswerDraft, Citation};
    use crate::types::claim::{ClaimComponent, Question};
    use crate::types::document::Document;

    fn result(verdict: Verdict, reasoning: &str) -> PipelineResult {
        PipelineResult::new(Evaluation::new(verdict, 0.7, reasoning).unwrap(), vec![])
    }

    #[test]
    fn test_from_passes_picks_first_match() {
        let passes = vec![
            result(Verdict::True, "first"),
            result(Verdict::False, "second"),
            result(Verdict::False, "third"),
        ];

        let record = RunRecord::from_passes(Statement::new("x"), passes, Verdict::False).unwrap();
        assert_eq!(record.reasoning, "second");
    }

    #[test]
    fn test_from_passes_none_when_unmatched() {
        let passes = vec![result(Verdict::True, "only")];
        let record = RunRecord::from_passes(Statement::new("x"), passes, Verdict::Unverifiable);
        assert!(record.is_none());
    }

    #[test]
    fn test_record_json_shape() {
        let doc = Document::new("CPI rose 3.4% in December")
            .with_title("CPI Release")
            .with_url("https://bls.gov/cpi");
        let mut component = ClaimComponent::from(Question::new(
            "What was the inflation rate in January 2024?",
            ["inflation rate January 2024"],
        ));
        component.answer = Some(Answer::from_draft(
            AnswerDraft::new("3.4%").with_citation(Citation::from_document(&doc, "rose 3.4%")),
            vec![doc],
        ));

        let mut claim = Claim::new("inflation fell to 2%");
        claim.components = Some(vec![component]);
        claim.evaluation = Some(Evaluation::new(Verdict::False, 0.9, "CPI was 3.4%").unwrap());

        let result = PipelineResult::new(
            Evaluation::new(Verdict::False, 0.85, "single false claim").unwrap(),
            vec![claim],
        );
        assert_eq!(result.citation_count(), 1);

        let record = RunRecord::from_result(Statement::new("inflation fell to 2%"), result);
        let value = serde_json::to_value(&record).unwrap();

        let component = &value["claims"][0]["components"][0];
        assert_eq!(component["search_queries"][0], "inflation rate January 2024");
        assert_eq!(component["answer"]["citations"][0]["source_url"], "https://bls.gov/cpi");
        assert_eq!(
            component["answer"]["retrieved_docs"][0]["metadata"]["title"],
            "CPI Release"
        );
        assert_eq!(value["verdict"], "FALSE");
    }

    #[test]
    fn test_record_round_trip_rejects_out_of_range_claim_confidence() {
        let mut claim = Claim::new("inflation fell to 2%");
        claim.components = Some(vec![]);
        claim.evaluation = Some(Evaluation::new(Verdict::False, 0.9, "CPI was 3.4%").unwrap());
        let record = RunRecord::from_result(
            Statement::new("inflation fell to 2%"),
            PipelineResult::new(Evaluation::new(Verdict::False, 0.9, "r").unwrap(), vec![claim]),
        );

        let mut value = serde_json::to_value(&record).unwrap();
        let back: RunRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, record);

        value["claims"][0]["confidence"] = serde_json::json!(1.5);
        assert!(serde_json::from_value::<RunRecord>(value).is_err());
    }
}
