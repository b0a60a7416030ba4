//! OpenAI-compatible implementation of the operators and embedder.
//!
//! Every operator uses JSON-schema structured outputs so responses can be
//! validated before they enter the pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use factcheck::ai::OpenAI;
//!
//! let ai = OpenAI::new("sk-...").with_model("gpt-4o-mini");
//! let pipeline = Pipeline::new(ai.clone(), Arc::new(ai), PipelineConfig::default());
//! ```

use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompts;
use super::schema::StructuredOutput;
use crate::error::{FactCheckError, Result};
use crate::security::{ProviderCredentials, SecretString};
use crate::traits::{ai::FactCheckAI, embedder::Embedder};
use crate::types::{
    answer::AnswerDraft,
    claim::{Claim, Evaluation, Question, Verdict},
    document::Document,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-backed operators and embeddings.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: SecretString,
    model: String,
    embedding_model: String,
    base_url: String,
}

impl OpenAI {
    /// Create a client with default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::new(api_key),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client from provider credentials.
    pub fn from_credentials(credentials: ProviderCredentials) -> Self {
        Self {
            client: Client::new(),
            api_key: credentials.api_key,
            model: credentials.model,
            embedding_model: credentials.embedding_model,
            base_url: credentials
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = SecretString::from_env("OPENAI_API_KEY")
            .ok_or_else(|| FactCheckError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key.expose()))
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set a custom base URL (for proxies and compatible gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Chat completion constrained to the schema of `T`.
    async fn structured<T: StructuredOutput>(&self, system: &str, user: &str) -> Result<T> {
        #[derive(Serialize)]
        struct StructuredRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            temperature: f32,
            response_format: ResponseFormat,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            format_type: &'static str,
            json_schema: JsonSchemaFormat,
        }

        #[derive(Serialize)]
        struct JsonSchemaFormat {
            name: String,
            strict: bool,
            schema: serde_json::Value,
        }

        let request = StructuredRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: T::type_name(),
                    strict: true,
                    schema: T::openai_schema(),
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FactCheckError::AI(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(FactCheckError::AI(
                format!("OpenAI API error {}: {}", status, error_text).into(),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| FactCheckError::AI(Box::new(e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FactCheckError::InvalidResponse {
                reason: "no content in completion".into(),
            })?;

        debug!(model = %self.model, schema = %T::type_name(), "Structured completion received");
        Ok(serde_json::from_str(&content)?)
    }

    async fn embed_many(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FactCheckError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FactCheckError::Embedding(format!(
                "OpenAI embedding error: {}",
                error_text
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| FactCheckError::Embedding(e.to_string()))?;

        if body.data.len() != inputs.len() {
            return Err(FactCheckError::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Deserialize, JsonSchema)]
struct ClaimsResponse {
    claims: Vec<String>,
}

#[derive(Deserialize, JsonSchema)]
struct QuestionsResponse {
    questions: Vec<Question>,
}

#[derive(Deserialize, JsonSchema)]
struct EvaluationResponse {
    verdict: Verdict,
    /// Between 0 and 1
    confidence: f64,
    reasoning: String,
}

impl EvaluationResponse {
    fn into_evaluation(self) -> Result<Evaluation> {
        Evaluation::new(self.verdict, self.confidence, self.reasoning)
    }
}

#[async_trait]
impl FactCheckAI for OpenAI {
    async fn extract_claims(&self, statement: &str) -> Result<Vec<String>> {
        let response: ClaimsResponse = self
            .structured(
                prompts::EXTRACT_CLAIMS_SYSTEM,
                &prompts::extract_claims_prompt(statement),
            )
            .await?;
        Ok(response.claims)
    }

    async fn generate_questions(&self, statement: &str, claim: &Claim) -> Result<Vec<Question>> {
        let response: QuestionsResponse = self
            .structured(
                prompts::GENERATE_QUESTIONS_SYSTEM,
                &prompts::generate_questions_prompt(statement, claim),
            )
            .await?;
        Ok(response.questions)
    }

    async fn synthesize_answer(
        &self,
        question: &Question,
        documents: &[Document],
    ) -> Result<AnswerDraft> {
        if documents.is_empty() {
            return Ok(AnswerDraft::insufficient_evidence());
        }

        self.structured(
            prompts::SYNTHESIZE_ANSWER_SYSTEM,
            &prompts::synthesize_answer_prompt(question, documents),
        )
        .await
    }

    async fn evaluate_claim(&self, claim: &Claim) -> Result<Evaluation> {
        let response: EvaluationResponse = self
            .structured(
                prompts::EVALUATE_CLAIM_SYSTEM,
                &prompts::evaluate_claim_prompt(claim),
            )
            .await?;
        response.into_evaluation()
    }

    async fn evaluate_statement(&self, statement: &str, claims: &[Claim]) -> Result<Evaluation> {
        let response: EvaluationResponse = self
            .structured(
                prompts::EVALUATE_STATEMENT_SYSTEM,
                &prompts::evaluate_statement_prompt(statement, claims),
            )
            .await?;
        response.into_evaluation()
    }
}

#[async_trait]
impl Embedder for OpenAI {
    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_many(&[text])
            .await?
            .pop()
            .ok_or_else(|| FactCheckError::Embedding("no embedding returned".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_many(texts).await
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
