use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::review::verify::{AnalysisRequest, AnalysisResponse, PageAnalyzer};

/// Delegates page loading and judging to a browser-automation service.
///
/// The service receives `{url, claim, instructions}` and answers with a JSON
/// object, optionally wrapped in `{"result": {...}}`.
pub struct RemotePageAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemotePageAnalyzer {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_env() -> Result<Self> {
        let endpoint = dotenv::var("PAGE_ANALYZER_URL")
            .context("PAGE_ANALYZER_URL required when PAGE_ANALYZER=remote")?;
        let api_key = dotenv::var("PAGE_ANALYZER_KEY").ok().filter(|k| !k.is_empty());
        Self::new(endpoint, api_key)
    }
}

#[async_trait]
impl PageAnalyzer for RemotePageAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let mut req = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await.context("analysis service request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("analysis service returned {}", status);
        }
        let body: Value = resp
            .json()
            .await
            .context("analysis service returned invalid JSON")?;
        debug!(url = %request.url, "analysis service replied");

        AnalysisResponse::from_json(unwrap_result(&body))
    }
}

fn unwrap_result(body: &Value) -> &Value {
    match body.get("result") {
        Some(inner) if inner.is_object() => inner,
        _ => body,
    }
}
