use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::warn;

use crate::review::coordinator::BatchLimits;
use crate::review::{ReviewEngine, ReviewLimits};

/// Review limits (admins can modify at runtime).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewConfig {
    pub concurrency: usize,
    pub link_timeout_secs: u64,
    pub batch_timeout_secs: u64,
    pub copy_timeout_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            link_timeout_secs: 60,
            batch_timeout_secs: 180,
            copy_timeout_secs: 60,
        }
    }
}

impl ReviewConfig {
    /// Defaults overridden by any `REVIEW_*` variables that parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            concurrency: env_or("REVIEW_CONCURRENCY", defaults.concurrency),
            link_timeout_secs: env_or("REVIEW_LINK_TIMEOUT_SECS", defaults.link_timeout_secs),
            batch_timeout_secs: env_or("REVIEW_BATCH_TIMEOUT_SECS", defaults.batch_timeout_secs),
            copy_timeout_secs: env_or("REVIEW_COPY_TIMEOUT_SECS", defaults.copy_timeout_secs),
        }
    }

    pub fn limits(&self) -> ReviewLimits {
        ReviewLimits {
            batch: BatchLimits {
                concurrency: self.concurrency.max(1),
                link_timeout: Duration::from_secs(self.link_timeout_secs.max(1)),
                batch_timeout: Duration::from_secs(self.batch_timeout_secs.max(1)),
            },
            copy_timeout: Duration::from_secs(self.copy_timeout_secs.max(1)),
        }
    }

    /// Set one field by name. Zero is rejected for every field.
    pub fn set(&mut self, key: &str, value: u64) -> Result<(), String> {
        if value == 0 {
            return Err(format!("`{}` must be at least 1", key));
        }
        match key {
            "concurrency" => self.concurrency = value as usize,
            "link_timeout_secs" => self.link_timeout_secs = value,
            "batch_timeout_secs" => self.batch_timeout_secs = value,
            "copy_timeout_secs" => self.copy_timeout_secs = value,
            _ => {
                return Err(format!(
                    "Unknown param `{}`. Valid: `concurrency`, `link_timeout_secs`, \
                     `batch_timeout_secs`, `copy_timeout_secs`",
                    key
                ))
            }
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match dotenv::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}

pub struct AppState {
    pub engine: Arc<ReviewEngine>,
    pub admin_ids: HashSet<u64>,
    pub review_config: Arc<RwLock<ReviewConfig>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Snapshot of the current limits; the lock is not held during a review.
    pub async fn limits(&self) -> ReviewLimits {
        self.review_config.read().await.limits()
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
