use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use factcheck::security::{ProviderCredentials, SecretString};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: ProviderCredentials,
    pub tavily_api_key: Option<SecretString>,
    pub serper_api_key: Option<SecretString>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let api_key =
            SecretString::from_env("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        Ok(Self {
            credentials: ProviderCredentials {
                api_key,
                model: env::var("FACTCHECK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
                embedding_model: env::var("FACTCHECK_EMBEDDING_MODEL")
                    .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
                base_url: env::var("OPENAI_BASE_URL").ok(),
            },
            tavily_api_key: SecretString::from_env("TAVILY_API_KEY"),
            serper_api_key: SecretString::from_env("SERPER_API_KEY"),
        })
    }
}
