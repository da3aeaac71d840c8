use crate::error::AppError;
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body posted to `<apiEndpoint>/analyze`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest<'a> {
    pub domain: &'a str,
    pub url: &'a str,
    pub profile_id: &'a str,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl AnalyzeResponse {
    /// Known tags in definition order; unknown strings are dropped.
    pub fn known_categories(&self) -> Vec<Category> {
        let mut tags: Vec<Category> = self
            .categories
            .iter()
            .filter_map(|s| match s.parse::<Category>() {
                Ok(tag) => Some(tag),
                Err(_) => {
                    log::debug!("Dropping unknown category from remote result: {s}");
                    None
                }
            })
            .collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }
}

/// Remote categorization backend.
pub trait RemoteCategorizer: Send + Sync {
    fn analyze(&self, request: &AnalyzeRequest<'_>) -> Result<AnalyzeResponse, AppError>;
}

/// Blocking HTTP client for the categorization backend.
pub struct HttpCategorizer {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpCategorizer {
    /// Returns `None` when `api_endpoint` is empty, which disables the remote tier.
    pub fn new(api_endpoint: &str, timeout: Duration) -> Result<Option<Self>, AppError> {
        let base = api_endpoint.trim().trim_end_matches('/');
        if base.is_empty() {
            return Ok(None);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::RemoteUnavailable(e.to_string()))?;

        Ok(Some(Self {
            client,
            endpoint: format!("{base}/analyze"),
        }))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RemoteCategorizer for HttpCategorizer {
    fn analyze(&self, request: &AnalyzeRequest<'_>) -> Result<AnalyzeResponse, AppError> {
        let unavailable = |e: reqwest::Error| AppError::RemoteUnavailable(e.to_string());

        let res = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(unavailable)?;
        if !res.status().is_success() {
            return Err(AppError::RemoteUnavailable(format!("http_{}", res.status().as_u16())));
        }
        res.json().map_err(unavailable)
    }
}
