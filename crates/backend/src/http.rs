use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::AnsweredItem;
use reqwest::Client;
use tracing::debug;

use crate::backend::{AssessmentBackend, BackendError, PoolResponse};
use crate::result::ResultSummary;
use crate::wire::{self, SubmitPayload};

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HttpConfig {
    /// Reads `QUIZ_API_URL` and `QUIZ_API_TIMEOUT_SECS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout = env::var("QUIZ_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);
        Self { base_url, timeout }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// `AssessmentBackend` over the quiz REST API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: HttpConfig,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl AssessmentBackend for HttpBackend {
    async fn fetch_pool(&self, topics: &[String]) -> Result<PoolResponse, BackendError> {
        let url = self.config.endpoint("api/quiz/adaptive-questions");
        let mut request = self.client.get(url);
        if !topics.is_empty() {
            request = request.query(&[("topics", topics.join(","))]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let pool = wire::parse_pool(&body)?;
        debug!(
            questions = pool.pool.total(),
            starting_level = %pool.starting_level,
            "fetched question pool"
        );
        Ok(pool)
    }

    async fn submit(&self, answers: &[AnsweredItem]) -> Result<ResultSummary, BackendError> {
        let url = self.config.endpoint("api/quiz/submit");
        let payload = SubmitPayload::from_answers(answers);

        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let summary: ResultSummary = serde_json::from_str(&body)?;
        debug!(answers = answers.len(), score = summary.score, "submission accepted");
        Ok(summary)
    }
}
