//! Concrete backends for the review pipeline's external services.

pub mod direct;
pub mod remote;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::llm::{LlmClient, Message};
use crate::review::copy::ReviewModel;
use crate::review::prompts::{COPY_REVIEW_PROMPT, COPY_REVIEW_SYSTEM};

pub use direct::DirectPageAnalyzer;
pub use remote::RemotePageAnalyzer;

/// Copy review through the chat completions API in JSON mode.
pub struct LlmReviewModel {
    llm: Arc<LlmClient>,
}

impl LlmReviewModel {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReviewModel for LlmReviewModel {
    async fn review(&self, text: &str) -> Result<String> {
        let messages = [
            Message::system(COPY_REVIEW_SYSTEM),
            Message::user(COPY_REVIEW_PROMPT.replace("{text}", text)),
        ];
        self.llm.chat(&messages, true).await
    }
}
