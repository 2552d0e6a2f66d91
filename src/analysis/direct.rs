use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::llm::{LlmClient, Message};
use crate::review::copy::json_object;
use crate::review::prompts::{PAGE_JUDGE_PROMPT, PAGE_JUDGE_SYSTEM};
use crate::review::verify::{AnalysisRequest, AnalysisResponse, PageAnalyzer};

/// Characters of page text handed to the model.
const MAX_PAGE_CHARS: usize = 6000;

/// Fetches the page itself and asks the LLM to judge it. No JavaScript is
/// run, so client-rendered pages look sparse.
pub struct DirectPageAnalyzer {
    client: reqwest::Client,
    llm: Arc<LlmClient>,
}

impl DirectPageAnalyzer {
    pub fn new(llm: Arc<LlmClient>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (compatible; copy-review-bot/0.1)")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, llm })
    }

    async fn fetch(&self, url: &str) -> Result<(Option<String>, String)> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch URL")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("page returned {}", status);
        }

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = resp.bytes().await.context("Failed to read response body")?;

        let (title, text) = if content_type.contains("html") {
            let raw = String::from_utf8_lossy(&body);
            let text = html2text::from_read(&body[..], 120)
                .unwrap_or_else(|_| raw.to_string());
            (page_title(&raw), text)
        } else {
            (None, String::from_utf8_lossy(&body).to_string())
        };

        Ok((title, truncate(&text, MAX_PAGE_CHARS)))
    }
}

#[async_trait]
impl PageAnalyzer for DirectPageAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let (title, content) = self.fetch(&request.url).await?;
        debug!(url = %request.url, title = ?title, len = content.len(), "page fetched");

        let prompt = PAGE_JUDGE_PROMPT
            .replace("{url}", &request.url)
            .replace("{claim}", &request.claim)
            .replace("{instructions}", request.instructions.as_deref().unwrap_or(""))
            .replace("{title}", title.as_deref().unwrap_or("(none)"))
            .replace("{content}", &content);
        let messages = [Message::system(PAGE_JUDGE_SYSTEM), Message::user(prompt)];

        let raw = self.llm.chat(&messages, true).await?;
        let value = json_object(&raw)
            .ok_or_else(|| anyhow::anyhow!("page judgment was not JSON"))?;
        let mut response = AnalysisResponse::from_json(&value)?;
        if response.page_title.is_none() {
            response.page_title = title;
        }
        Ok(response)
    }
}

/// Contents of the first `<title>` element, whitespace-collapsed.
fn page_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;
    let title = html[start..end]
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    Some(title).filter(|t| !t.is_empty())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
