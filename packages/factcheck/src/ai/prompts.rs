//! Prompt templates for the OpenAI operators.

use crate::types::{
    claim::{Claim, Question},
    document::Document,
};

pub const EXTRACT_CLAIMS_SYSTEM: &str = r#"You decompose statements into atomic claims for fact-checking.

Rules:
- Each claim must be independently verifiable and self-contained.
- Resolve pronouns and relative dates using the statement's context.
- Keep the originator's wording where it matters; do not add facts.
- Omit opinions, predictions and rhetorical flourishes that cannot be checked.
- Return the claims in the order they appear."#;

pub const GENERATE_QUESTIONS_SYSTEM: &str = r#"You plan evidence gathering for a single claim.

Produce the smallest set of factual questions whose answers would settle the
claim. For each question give one to three short web search queries, most
specific first. Include names, places and time periods from the statement."#;

pub const SYNTHESIZE_ANSWER_SYSTEM: &str = r#"You answer a question using only the numbered documents provided.

Rules:
- Base the answer strictly on the documents; never use outside knowledge.
- Cite every document you rely on with its url, title and a short verbatim snippet.
- If the documents do not answer the question, say so plainly and return no citations.
- End the answer with a line starting "Reasoning:" explaining how the evidence supports it."#;

pub const EVALUATE_CLAIM_SYSTEM: &str = r#"You judge a claim from the answered questions gathered for it.

Verdicts:
- TRUE: the evidence supports the claim.
- FALSE: the evidence contradicts the claim.
- UNVERIFIABLE: the evidence is missing, insufficient or conflicting.

Confidence is a number between 0 and 1. Explain the verdict in the reasoning,
referring to the answers and their sources."#;

pub const EVALUATE_STATEMENT_SYSTEM: &str = r#"You judge a whole statement from the verdicts on its claims.

Weigh each claim by how central it is to the statement. Use the same verdict
vocabulary (TRUE, FALSE, UNVERIFIABLE) and a confidence between 0 and 1, and
explain how the claim verdicts combine."#;

/// User prompt for claim extraction.
pub fn extract_claims_prompt(statement: &str) -> String {
    format!("Statement:\n{}", statement)
}

/// User prompt for question generation.
pub fn generate_questions_prompt(statement: &str, claim: &Claim) -> String {
    format!("Statement:\n{}\n\nClaim:\n{}", statement, claim.text)
}

/// User prompt for answer synthesis.
pub fn synthesize_answer_prompt(question: &Question, documents: &[Document]) -> String {
    format!(
        "Question:\n{}\n\nDocuments:\n{}",
        question.question,
        format_documents(documents)
    )
}

/// User prompt for claim evaluation.
pub fn evaluate_claim_prompt(claim: &Claim) -> String {
    let mut out = format!("Claim:\n{}\n\nAnswered questions:\n", claim.text);

    for (i, component) in claim.components().iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, component.question));
        match &component.answer {
            Some(answer) => {
                out.push_str(&format!("Answer: {}\n", answer.text));
                for citation in &answer.citations {
                    out.push_str(&format!(
                        "  - {} ({}): \"{}\"\n",
                        citation.source_title, citation.source_url, citation.snippet
                    ));
                }
            }
            None => out.push_str("Answer: (none)\n"),
        }
    }

    out
}

/// User prompt for overall statement evaluation.
pub fn evaluate_statement_prompt(statement: &str, claims: &[Claim]) -> String {
    let mut out = format!("Statement:\n{}\n\nClaims:\n", statement);

    for (i, claim) in claims.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, claim.text));
        if let Some(evaluation) = &claim.evaluation {
            out.push_str(&format!(
                "Verdict: {} (confidence {})\nReasoning: {}\n",
                evaluation.verdict, evaluation.confidence, evaluation.reasoning
            ));
        }
    }

    out
}

/// Render documents as a numbered list with their metadata.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "[{}] {}\nURL: {}\n{}\n",
                i + 1,
                doc.title().unwrap_or("Untitled"),
                doc.url().unwrap_or("(none)"),
                doc.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_documents() {
        let docs = vec![
            Document::new("CPI rose 3.1%").with_title("CPI").with_url("https://bls.gov/cpi"),
            Document::new("User notes"),
        ];
        let text = format_documents(&docs);

        assert!(text.contains("[1] CPI\nURL: https://bls.gov/cpi\nCPI rose 3.1%"));
        assert!(text.contains("[2] Untitled\nURL: (none)"));
    }

    #[test]
    fn test_evaluate_claim_prompt_lists_components() {
        let mut claim = Claim::new("Inflation fell to 2%");
        claim.components = Some(vec![Question::new("What was inflation?", ["cpi"]).into()]);

        let prompt = evaluate_claim_prompt(&claim);
        assert!(prompt.contains("1. What was inflation?"));
        assert!(prompt.contains("Answer: (none)"));
    }
}
