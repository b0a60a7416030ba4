//! Web searcher trait for evidence acquisition.
//!
//! When enabled, every search query of a claim component is first sent to a
//! `WebSearcher`; the results become documents in the run's index before the
//! same query is retrieved. Results are not assumed stable across calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::{FactCheckError, Result};
use crate::security::SecretString;

/// A search hit with the metadata evidence documents are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Title of the page
    pub title: String,

    /// URL of the page
    pub url: String,

    /// Excerpt or snippet returned by the provider
    pub excerpt: String,

    /// Provider or publisher name
    pub source: String,
}

impl SearchResult {
    /// Create a new search result.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        excerpt: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            excerpt: excerpt.into(),
            source: String::new(),
        }
    }

    /// Set the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Hostname of the URL, lower-cased, if it parses.
    pub fn site(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }
}

/// Web search for open-world evidence.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for results relevant to the query.
    ///
    /// May return an empty list.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Provider name, recorded as the `source` of results that lack one.
    fn name(&self) -> &str;
}

/// Mock web searcher for testing.
#[derive(Default)]
pub struct MockWebSearcher {
    results: RwLock<HashMap<String, Vec<SearchResult>>>,
    failing: RwLock<HashSet<String>>,
    calls: RwLock<Vec<String>>,
}

impl MockWebSearcher {
    /// Create a new mock searcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for a query.
    pub fn with_results(self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// Make searches for a query fail.
    pub fn failing_on(self, query: &str) -> Self {
        self.failing.write().unwrap().insert(query.to_string());
        self
    }

    /// Queries searched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.calls.write().unwrap().push(query.to_string());

        if self.failing.read().unwrap().contains(query) {
            return Err(FactCheckError::Search(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Mock search provider unavailable",
            ))));
        }

        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn search_error(message: String) -> FactCheckError {
    FactCheckError::Search(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        message,
    )))
}

/// Tavily-backed web searcher.
pub struct TavilyWebSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    /// Number of results requested per query.
    pub max_results: usize,
}

impl TavilyWebSearcher {
    /// Create a new Tavily web searcher.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            client: reqwest::Client::new(),
            max_results: 5,
        }
    }

    /// Set the per-query result limit.
    pub fn with_max_results(mut self, limit: usize) -> Self {
        self.max_results = limit;
        self
    }
}

#[async_trait]
impl WebSearcher for TavilyWebSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            query: &'a str,
            search_depth: &'a str,
            max_results: usize,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            results: Vec<TavilyResult>,
        }

        #[derive(serde::Deserialize)]
        struct TavilyResult {
            url: String,
            title: Option<String>,
            content: Option<String>,
        }

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&Request {
                query,
                search_depth: "basic",
                max_results: self.max_results,
            })
            .send()
            .await
            .map_err(|e| FactCheckError::Search(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(search_error(format!(
                "Tavily API error: {}",
                response.status()
            )));
        }

        let body: Response = response
            .json()
            .await
            .map_err(|e| FactCheckError::Search(Box::new(e)))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| {
                SearchResult::new(
                    r.title.unwrap_or_default(),
                    r.url,
                    r.content.unwrap_or_default(),
                )
                .with_source(self.name())
            })
            .collect())
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

/// Serper (Google results) web searcher.
pub struct SerperWebSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    /// Number of results requested per query.
    pub max_results: usize,
}

impl SerperWebSearcher {
    /// Create a new Serper web searcher.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            client: reqwest::Client::new(),
            max_results: 5,
        }
    }

    /// Set the per-query result limit.
    pub fn with_max_results(mut self, limit: usize) -> Self {
        self.max_results = limit;
        self
    }
}

#[async_trait]
impl WebSearcher for SerperWebSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            q: &'a str,
            num: usize,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(default)]
            organic: Vec<Organic>,
        }

        #[derive(serde::Deserialize)]
        struct Organic {
            title: Option<String>,
            link: String,
            snippet: Option<String>,
        }

        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&Request {
                q: query,
                num: self.max_results,
            })
            .send()
            .await
            .map_err(|e| FactCheckError::Search(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(search_error(format!(
                "Serper API error: {}",
                response.status()
            )));
        }

        let body: Response = response
            .json()
            .await
            .map_err(|e| FactCheckError::Search(Box::new(e)))?;

        Ok(body
            .organic
            .into_iter()
            .take(self.max_results)
            .map(|r| {
                let result = SearchResult::new(
                    r.title.unwrap_or_default(),
                    r.link,
                    r.snippet.unwrap_or_default(),
                );
                let source = result.site().unwrap_or_else(|| self.name().to_string());
                result.with_source(source)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "serper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_web_searcher() {
        let searcher = MockWebSearcher::new().with_results(
            "inflation rate January 2024",
            vec![
                SearchResult::new("CPI", "https://bls.gov/cpi", "CPI rose 3.1%"),
                SearchResult::new("News", "https://news.example/inflation", "Inflation cooled"),
            ],
        );

        let results = searcher.search("inflation rate January 2024").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://bls.gov/cpi");

        let empty = searcher.search("unknown").await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(searcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_web_searcher_failure() {
        let searcher = MockWebSearcher::new().failing_on("broken");
        let err = searcher.search("broken").await.unwrap_err();
        assert!(matches!(err, FactCheckError::Search(_)));
    }

    #[test]
    fn test_search_result_site() {
        let result = SearchResult::new("t", "https://WWW.Example.com/a", "x");
        assert_eq!(result.site().as_deref(), Some("www.example.com"));
        assert!(SearchResult::new("t", "not a url", "x").site().is_none());
    }
}
