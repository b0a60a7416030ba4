//! The six-stage verification pipeline.
//!
//! One run takes a statement through claim extraction, question generation,
//! evidence retrieval, answer synthesis, claim evaluation and overall
//! evaluation, strictly in that order and in extraction/generation order
//! within each stage. Each run owns a fresh [`HybridRetriever`]; evidence
//! fetched for one query stays retrievable by every later query of the run
//! and is discarded when the run ends.

use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{FactCheckError, Location, Result, Stage};
use crate::pipeline::acquire::EvidenceAcquirer;
use crate::pipeline::chunk::chunk_document;
use crate::pipeline::index::HybridRetriever;
use crate::pipeline::progress::{NoopObserver, ProgressObserver, ProgressUpdate};
use crate::pipeline::retry::with_retry;
use crate::traits::{ai::FactCheckAI, embedder::Embedder, searcher::WebSearcher};
use crate::types::{
    answer::Answer,
    claim::{Claim, ClaimComponent, Question},
    config::PipelineConfig,
    document::Document,
    record::PipelineResult,
    statement::Statement,
};

/// Drives statements through the verification stages.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = Pipeline::new(ai, embedder, PipelineConfig::default())
///     .with_searcher(Arc::new(TavilyWebSearcher::new(api_key)));
///
/// let statement = Statement::new("Inflation fell to 2%.").with_originator("Org X");
/// let result = pipeline.run(&statement).await?;
/// println!("{} ({})", result.verdict, result.confidence);
/// ```
pub struct Pipeline<A: FactCheckAI, E: Embedder> {
    ai: A,
    embedder: Arc<E>,
    config: PipelineConfig,
    acquirer: EvidenceAcquirer,
    context: Vec<Document>,
    observer: Arc<dyn ProgressObserver>,
}

impl<A: FactCheckAI, E: Embedder> Pipeline<A, E> {
    /// Create a pipeline in closed-corpus mode.
    pub fn new(ai: A, embedder: Arc<E>, config: PipelineConfig) -> Self {
        Self {
            ai,
            embedder,
            config,
            acquirer: EvidenceAcquirer::disabled(),
            context: Vec::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Fetch web evidence for every search query.
    ///
    /// Has no effect when `config.web_search` is false.
    pub fn with_searcher(mut self, searcher: Arc<dyn WebSearcher>) -> Self {
        self.acquirer = EvidenceAcquirer::new(searcher)
            .with_chunking(self.config.chunking)
            .with_timeout(self.config.retry.call_timeout);
        self
    }

    /// Seed every run's index with caller-supplied documents.
    pub fn with_context_documents(mut self, documents: Vec<Document>) -> Self {
        self.context = documents;
        self
    }

    /// Report progress to an observer.
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Verify a statement.
    pub async fn run(&self, statement: &Statement) -> Result<PipelineResult> {
        self.run_with_cancel(statement, CancellationToken::new()).await
    }

    /// Verify a statement, stopping early once `cancel` fires.
    ///
    /// Cancellation is observed at every stage boundary and abandons any
    /// in-flight external call. Nothing from a cancelled run is returned.
    pub async fn run_with_cancel(
        &self,
        statement: &Statement,
        cancel: CancellationToken,
    ) -> Result<PipelineResult> {
        statement.validate()?;
        self.config.validate()?;
        self.config
            .retriever
            .check_embedder(self.embedder.model_name())?;

        let retriever = HybridRetriever::new(self.embedder.clone(), self.config.retriever.clone());
        let framed = statement.framed();

        info!(statement = %framed, "Starting verification run");

        self.seed_context(&retriever, &cancel).await?;

        // Claim extraction
        self.checkpoint(Stage::ClaimExtraction, &cancel)?;
        let extracted = self
            .call(Stage::ClaimExtraction, Location::statement(), &cancel, || {
                self.ai.extract_claims(&framed)
            })
            .await?;

        let mut claims: Vec<Claim> = extracted
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .map(Claim::new)
            .collect();

        if claims.is_empty() {
            warn!(statement = %framed, "No claims extracted");
            return Err(FactCheckError::EmptyExtraction);
        }
        info!(count = claims.len(), "Extracted claims");

        // Question generation
        self.checkpoint(Stage::QuestionGeneration, &cancel)?;
        for (i, claim) in claims.iter_mut().enumerate() {
            let current: &Claim = claim;
            let questions = self
                .call(Stage::QuestionGeneration, Location::claim(i), &cancel, || {
                    self.ai.generate_questions(&framed, current)
                })
                .await?;

            debug!(claim = i, count = questions.len(), "Generated questions");
            claim.components = Some(
                questions
                    .into_iter()
                    .map(|mut question| {
                        question.search_queries.retain(|q| !q.trim().is_empty());
                        ClaimComponent::from(question)
                    })
                    .collect(),
            );
        }

        // Evidence retrieval and answer synthesis
        self.checkpoint(Stage::EvidenceRetrieval, &cancel)?;
        for (i, claim) in claims.iter_mut().enumerate() {
            for (j, component) in claim.components.iter_mut().flatten().enumerate() {
                let location = Location::component(i, j);
                let documents = self
                    .gather_evidence(&retriever, &component.search_queries, location, &cancel)
                    .await?;

                if documents.is_empty() {
                    warn!(claim = i, component = j, "No evidence retrieved for component");
                }

                let question = Question::new(
                    component.question.clone(),
                    component.search_queries.clone(),
                );
                let draft = self
                    .call(Stage::AnswerSynthesis, location, &cancel, || {
                        self.ai.synthesize_answer(&question, &documents)
                    })
                    .await?;

                debug!(
                    claim = i,
                    component = j,
                    citations = draft.citations.len(),
                    documents = documents.len(),
                    "Synthesized answer"
                );
                component.answer = Some(Answer::from_draft(draft, documents));
            }
        }

        // Claim evaluation
        self.checkpoint(Stage::ClaimEvaluation, &cancel)?;
        for (i, claim) in claims.iter_mut().enumerate() {
            let current: &Claim = claim;
            let evaluation = self
                .call(Stage::ClaimEvaluation, Location::claim(i), &cancel, || {
                    self.ai.evaluate_claim(current)
                })
                .await?;

            info!(
                claim = i,
                verdict = %evaluation.verdict,
                confidence = %evaluation.confidence,
                "Evaluated claim"
            );
            claim.evaluation = Some(evaluation);
        }

        // Overall evaluation
        self.checkpoint(Stage::OverallEvaluation, &cancel)?;
        let overall = self
            .call(Stage::OverallEvaluation, Location::statement(), &cancel, || {
                self.ai.evaluate_statement(&framed, &claims)
            })
            .await?;

        info!(
            verdict = %overall.verdict,
            confidence = %overall.confidence,
            documents = retriever.len().await,
            "Verification complete"
        );
        self.observer.on_progress(ProgressUpdate::complete());

        Ok(PipelineResult::new(overall, claims))
    }

    /// Acquire and retrieve evidence for each query, in order.
    ///
    /// Retrieved lists are concatenated without deduplication.
    async fn gather_evidence(
        &self,
        retriever: &HybridRetriever<E>,
        queries: &[String],
        location: Location,
        cancel: &CancellationToken,
    ) -> Result<Vec<Document>> {
        let top_k = self.config.retriever.top_k;
        let mut documents = Vec::new();

        for query in queries {
            if self.config.web_search && self.acquirer.is_enabled() {
                let fetched = cancellable(cancel, Stage::EvidenceRetrieval, async {
                    Ok(self.acquirer.fetch(query).await)
                })
                .await?;

                if !fetched.is_empty() {
                    let added = self
                        .call(Stage::EvidenceRetrieval, location, cancel, || {
                            retriever.add(fetched.clone())
                        })
                        .await?;
                    debug!(
                        query = %query,
                        fetched = fetched.len(),
                        added,
                        "Ingested web evidence"
                    );
                }
            }

            let retrieved = self
                .call(Stage::EvidenceRetrieval, location, cancel, || {
                    retriever.retrieve(query, top_k)
                })
                .await?;

            debug!(query = %query, count = retrieved.len(), "Retrieved evidence");
            documents.extend(retrieved);
        }

        Ok(documents)
    }

    async fn seed_context(
        &self,
        retriever: &HybridRetriever<E>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if self.context.is_empty() {
            return Ok(());
        }

        let documents: Vec<Document> = match &self.config.chunking {
            Some(chunking) => self
                .context
                .iter()
                .cloned()
                .flat_map(|doc| chunk_document(doc, chunking))
                .collect(),
            None => self.context.clone(),
        };

        let added = self
            .call(Stage::EvidenceRetrieval, Location::statement(), cancel, || {
                retriever.add(documents.clone())
            })
            .await?;

        info!(added, "Seeded context documents");
        Ok(())
    }

    /// Retry an external call under the run's policy, abandoning it on
    /// cancellation.
    async fn call<T, F, Fut>(
        &self,
        stage: Stage,
        location: Location,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        cancellable(cancel, stage, with_retry(&self.config.retry, stage, location, op)).await
    }

    fn checkpoint(&self, stage: Stage, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            info!(stage = %stage, "Run cancelled");
            return Err(FactCheckError::Cancelled { stage: Some(stage) });
        }

        info!(stage = %stage, "Stage started");
        self.observer.on_progress(ProgressUpdate::starting(stage));
        Ok(())
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    stage: Stage,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FactCheckError::Cancelled { stage: Some(stage) }),
        result = fut => result,
    }
}
