//! Verify a statement against a fixed set of documents.
//!
//! Runs entirely offline with the mock operators and embedder.
//!
//! ```sh
//! cargo run -p factcheck --example closed_corpus
//! ```

use std::sync::Arc;

use factcheck::testing::{MockAI, MockEmbedder};
use factcheck::{Document, Pipeline, PipelineConfig, Question, RetrieverConfig, Statement};

#[tokio::main]
async fn main() -> factcheck::Result<()> {
    let statement =
        Statement::new("Unemployment fell to 3.5% last year.").with_originator("Senator Y");

    let ai = MockAI::new()
        .with_claims(statement.framed(), vec!["Unemployment fell to 3.5% last year"])
        .with_questions(
            "Unemployment fell to 3.5% last year",
            vec![Question::new(
                "What was the unemployment rate last year?",
                ["unemployment rate", "jobs report unemployment"],
            )],
        );

    let corpus = vec![
        Document::new("The unemployment rate fell to 3.5 percent in December.")
            .with_title("Jobs report")
            .with_url("https://example.gov/jobs"),
        Document::new("Average hourly earnings rose 4.1 percent over the year.")
            .with_title("Wages")
            .with_url("https://example.gov/wages"),
        Document::new("Payrolls grew by 216,000 jobs, beating forecasts.")
            .with_title("Payrolls")
            .with_url("https://example.com/payrolls"),
    ];

    let config = PipelineConfig::default().with_retriever(RetrieverConfig::default().with_top_k(2));
    let pipeline = Pipeline::new(Arc::new(ai), Arc::new(MockEmbedder::new()), config)
        .with_context_documents(corpus);

    let result = pipeline.run(&statement).await?;

    println!("Verdict: {} ({})", result.verdict, result.confidence);
    for claim in &result.claims {
        println!("\nClaim: {}", claim.text);
        for component in claim.components() {
            println!("  Q: {}", component.question);
            if let Some(answer) = &component.answer {
                println!("  A: {}", answer.text);
                for citation in &answer.citations {
                    println!("     [{}] {}", citation.source_title, citation.source_url);
                }
            }
        }
    }

    Ok(())
}
