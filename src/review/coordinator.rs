use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::types::{ClaimLinkPair, VerificationResult};
use super::verify::PageVerifier;

/// Limits for one batch of link checks.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    /// Maximum verifications in flight at once.
    pub concurrency: usize,
    pub link_timeout: Duration,
    /// Ceiling for the whole batch; anything unfinished by then is failed.
    pub batch_timeout: Duration,
}

/// Runs the page verifier over every pair under a concurrency bound.
pub struct VerificationCoordinator {
    verifier: Arc<PageVerifier>,
}

impl VerificationCoordinator {
    pub fn new(verifier: Arc<PageVerifier>) -> Self {
        Self { verifier }
    }

    /// Verify all pairs. Returns exactly one result per pair, in input order.
    pub async fn verify_all(
        &self,
        pairs: &[ClaimLinkPair],
        limits: BatchLimits,
    ) -> Vec<VerificationResult> {
        if pairs.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let deadline = started + limits.batch_timeout;
        let concurrency = limits.concurrency.clamp(1, pairs.len());
        let mut slots: Vec<Option<VerificationResult>> = vec![None; pairs.len()];

        info!(
            links = pairs.len(),
            concurrency,
            link_timeout = ?limits.link_timeout,
            batch_timeout = ?limits.batch_timeout,
            "verifying links"
        );

        {
            let mut in_flight = futures::stream::iter(pairs.iter().cloned().enumerate().map(
                |(slot, pair)| {
                    let verifier = self.verifier.clone();
                    let link_timeout = limits.link_timeout;
                    async move { (slot, verifier.verify(pair, link_timeout).await) }
                },
            ))
            .buffer_unordered(concurrency);

            loop {
                match tokio::time::timeout_at(deadline, in_flight.next()).await {
                    Ok(Some((slot, result))) => {
                        debug!(slot, verdict = ?result.verdict, "link verified");
                        slots[slot] = Some(result);
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            pending = slots.iter().filter(|s| s.is_none()).count(),
                            "link batch hit its deadline"
                        );
                        break;
                    }
                }
            }
            // Dropping the stream here cancels in-flight checks and discards queued ones.
        }

        let results: Vec<VerificationResult> = slots
            .into_iter()
            .zip(pairs)
            .map(|(slot, pair)| {
                slot.unwrap_or_else(|| {
                    VerificationResult::failed(pair.clone(), "did not complete in time")
                })
            })
            .collect();

        info!(
            links = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "link batch complete"
        );
        results
    }
}
