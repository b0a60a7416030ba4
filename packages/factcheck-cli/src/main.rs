// Command-line entry point for statement verification

mod config;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use factcheck::ai::OpenAI;
use factcheck::review::load_progress;
use factcheck::{
    ChunkConfig, Document, Pipeline, PipelineConfig, ProgressUpdate, RetrieverConfig, RunRecord,
    SerperWebSearcher, Statement, TavilyWebSearcher, Verdict, WebSearcher,
};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "factcheck", about = "Verify statements against retrieved evidence")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify one statement and print its run record
    Check {
        statement: String,

        /// When the statement was made (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Who made the statement
        #[arg(long)]
        originator: Option<String>,

        /// Number of independent runs
        #[arg(long, default_value_t = 1)]
        passes: usize,

        /// Record the first run reaching this verdict
        #[arg(long)]
        prefer: Option<Verdict>,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Verify every statement in a JSON-lines file
    Batch {
        input: PathBuf,

        /// Write run records here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Summarize a review progress file
    Review { progress: PathBuf },
}

#[derive(Args, Debug, Clone)]
struct RunOptions {
    /// Plain-text file indexed as user-provided context
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Retrieve from context documents only
    #[arg(long)]
    no_web_search: bool,

    #[arg(long, value_enum, default_value_t = SearchProvider::Tavily)]
    search_provider: SearchProvider,

    /// Documents retrieved per search query
    #[arg(long)]
    top_k: Option<usize>,

    /// Weight of the lexical score in [0, 1]
    #[arg(long)]
    lexical_weight: Option<f32>,

    /// Split long evidence into sentence-aligned chunks before indexing
    #[arg(long)]
    chunk: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SearchProvider {
    Tavily,
    Serper,
}

impl RunOptions {
    fn pipeline_config(&self, embedding_model: &str) -> PipelineConfig {
        let mut retriever = RetrieverConfig::default().with_embedding_model(embedding_model);
        if let Some(k) = self.top_k {
            retriever = retriever.with_top_k(k);
        }
        if let Some(weight) = self.lexical_weight {
            retriever = retriever.with_lexical_weight(weight);
        }

        let mut config = PipelineConfig::default()
            .with_retriever(retriever)
            .with_web_search(!self.no_web_search);
        if self.chunk {
            config = config.with_chunking(ChunkConfig::default());
        }
        config
    }

    fn searcher(&self, config: &Config) -> Result<Option<Arc<dyn WebSearcher>>> {
        if self.no_web_search {
            return Ok(None);
        }

        let searcher: Arc<dyn WebSearcher> = match self.search_provider {
            SearchProvider::Tavily => {
                let key = config
                    .tavily_api_key
                    .as_ref()
                    .context("TAVILY_API_KEY must be set (or pass --no-web-search)")?;
                Arc::new(TavilyWebSearcher::new(key.expose()))
            }
            SearchProvider::Serper => {
                let key = config
                    .serper_api_key
                    .as_ref()
                    .context("SERPER_API_KEY must be set (or pass --no-web-search)")?;
                Arc::new(SerperWebSearcher::new(key.expose()))
            }
        };
        Ok(Some(searcher))
    }

    fn context_documents(&self) -> Result<Vec<Document>> {
        let Some(path) = &self.context_file else {
            return Ok(Vec::new());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?;
        Ok(vec![Document::new(text).with_title("User Provided Context")])
    }
}

fn build_pipeline(config: &Config, options: &RunOptions) -> Result<Pipeline<Arc<OpenAI>, OpenAI>> {
    let ai = Arc::new(OpenAI::from_credentials(config.credentials.clone()));

    let pipeline_config = options.pipeline_config(ai.embedding_model());
    pipeline_config
        .validate()
        .context("Invalid retriever options")?;

    let mut pipeline = Pipeline::new(ai.clone(), ai, pipeline_config)
        .with_context_documents(options.context_documents()?)
        .with_observer(|update: ProgressUpdate| {
            tracing::debug!(progress = update.fraction, "{}", update.message);
        });

    if let Some(searcher) = options.searcher(config)? {
        pipeline = pipeline.with_searcher(searcher);
    }

    Ok(pipeline)
}

/// Cancel in-flight runs on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            token.cancel();
        }
    });
    cancel
}

/// Parse one line of a batch input file.
fn parse_statement(line: &str) -> Result<Statement> {
    let statement: Statement = serde_json::from_str(line).context("Invalid statement JSON")?;
    statement.validate()?;
    Ok(statement)
}

async fn check(
    statement: Statement,
    passes: usize,
    prefer: Option<Verdict>,
    options: RunOptions,
) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pipeline = build_pipeline(&config, &options)?;
    let cancel = cancel_on_interrupt();

    let mut results = Vec::with_capacity(passes.max(1));
    for pass in 0..passes.max(1) {
        tracing::info!(pass, "Starting pass");
        let result = pipeline
            .run_with_cancel(&statement, cancel.clone())
            .await
            .with_context(|| format!("Pass {} failed", pass + 1))?;
        results.push(result);
    }

    let record = match prefer {
        Some(verdict) => RunRecord::from_passes(statement.clone(), results.clone(), verdict),
        None => None,
    }
    .or_else(|| {
        results
            .into_iter()
            .next()
            .map(|first| RunRecord::from_result(statement, first))
    })
    .context("No passes completed")?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn batch(input: PathBuf, output: Option<PathBuf>, options: RunOptions) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pipeline = build_pipeline(&config, &options)?;
    let cancel = cancel_on_interrupt();

    let contents = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let (mut succeeded, mut failed) = (0usize, 0usize);
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if cancel.is_cancelled() {
            break;
        }

        let statement = match parse_statement(line) {
            Ok(statement) => statement,
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "Skipping statement");
                failed += 1;
                continue;
            }
        };

        match pipeline.run_with_cancel(&statement, cancel.clone()).await {
            Ok(result) => {
                let record = RunRecord::from_result(statement, result);
                writeln!(writer, "{}", serde_json::to_string(&record)?)?;
                succeeded += 1;
            }
            Err(e) => {
                tracing::error!(line = line_no + 1, error = %e, "Statement failed");
                failed += 1;
            }
        }
    }

    writer.flush()?;
    tracing::info!(succeeded, failed, "Batch complete");
    Ok(())
}

fn review(progress: PathBuf) -> Result<()> {
    let json = fs::read_to_string(&progress)
        .with_context(|| format!("Failed to read {}", progress.display()))?;
    let loaded = load_progress(&json).context("Failed to load review progress")?;

    for (index, entry) in &loaded.entries {
        println!(
            "{index:>4}  {:<12} {:<18} {}",
            entry.overall_verdict, entry.llm_evaluation, entry.statement
        );
    }
    for skipped in &loaded.skipped {
        println!("skipped {}: {}", skipped.key, skipped.reason);
    }

    println!();
    println!("{} entries loaded, {} skipped", loaded.entries.len(), loaded.skipped.len());
    for (agreement, count) in loaded.agreement_counts() {
        println!("  {agreement}: {count}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging on stderr so records on stdout stay parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,factcheck=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match Cli::parse().command {
        Command::Check {
            statement,
            date,
            originator,
            passes,
            prefer,
            options,
        } => {
            let mut statement = Statement::new(statement);
            if let Some(date) = date {
                statement = statement.with_date(date);
            }
            if let Some(originator) = originator {
                statement = statement.with_originator(originator);
            }
            check(statement, passes, prefer, options).await
        }
        Command::Batch {
            input,
            output,
            options,
        } => batch(input, output, options).await,
        Command::Review { progress } => review(progress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_flags() {
        let cli = Cli::try_parse_from([
            "factcheck",
            "check",
            "inflation fell to 2%.",
            "--date",
            "2024-01-01",
            "--originator",
            "Org X",
            "--search-provider",
            "serper",
            "--top-k",
            "2",
            "--lexical-weight",
            "0.3",
            "--chunk",
        ])
        .unwrap();

        let Command::Check {
            date,
            originator,
            options,
            passes,
            ..
        } = cli.command
        else {
            panic!("expected check");
        };
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(originator.as_deref(), Some("Org X"));
        assert_eq!(passes, 1);
        assert_eq!(options.search_provider, SearchProvider::Serper);

        let config = options.pipeline_config("text-embedding-3-small");
        assert_eq!(config.retriever.top_k, 2);
        assert_eq!(config.retriever.lexical_weight, 0.3);
        assert!(config.web_search);
        assert_eq!(config.chunking, Some(ChunkConfig::default()));
    }

    #[test]
    fn test_prefer_verdict_parses() {
        let args = ["factcheck", "check", "x", "--passes", "3", "--prefer", "FALSE"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Check {
                passes: 3,
                prefer: Some(Verdict::False),
                ..
            }
        ));
    }

    #[test]
    fn test_no_web_search_defaults() {
        let cli =
            Cli::try_parse_from(["factcheck", "batch", "in.jsonl", "--no-web-search"]).unwrap();
        let Command::Batch { options, output, .. } = cli.command else {
            panic!("expected batch");
        };
        assert!(output.is_none());

        let config = options.pipeline_config("text-embedding-3-small");
        assert!(!config.web_search);
        assert_eq!(config.retriever.top_k, 10);
        assert!(config.chunking.is_none());
    }

    #[test]
    fn test_parse_statement_line() {
        let line = r#"{"text": "inflation fell to 2%.", "date": "2024-01-01", "originator": "X"}"#;
        let statement = parse_statement(line).unwrap();
        assert_eq!(
            statement.framed(),
            "On 2024-01-01, X claimed: inflation fell to 2%."
        );

        assert!(parse_statement(r#"{"text": "  "}"#).is_err());
        assert!(parse_statement("not json").is_err());
    }
}
