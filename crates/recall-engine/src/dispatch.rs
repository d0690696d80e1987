//! Concurrent fan-out to retrieval sources.
//!
//! Each enabled source runs in its own task, bounded by the shared
//! deadline and wrapped in a bounded retry with exponential backoff.
//! Partial failure is the expected steady state: a source that times out,
//! exhausts its retries, or panics resolves to an empty hit list without
//! touching its siblings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use recall_core::{RecallHit, RecallRequest, RecallSource, ResolvedConfig, Result};

/// Base delay for retry backoff; attempt `n` sleeps `base * 2^n`.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Invoke every enabled source concurrently against the request.
///
/// Returns a map from source name to its (possibly empty) hit list. No
/// ordering is guaranteed between sources' completion times; callers must
/// not assume any. Enabled names with no registered source are skipped.
pub async fn fan_out(
    registry: &HashMap<String, Arc<dyn RecallSource>>,
    request: &Arc<RecallRequest>,
    config: &ResolvedConfig,
) -> HashMap<String, Vec<RecallHit>> {
    let mut tasks = JoinSet::new();
    // Every dispatched source starts with an empty entry, so a task that
    // panics still resolves to empty rather than vanishing from the map
    let mut results: HashMap<String, Vec<RecallHit>> = HashMap::new();

    for name in &config.sources {
        let source = match registry.get(name) {
            Some(source) => Arc::clone(source),
            None => {
                warn!("Fan-out: source {} enabled but not registered, skipping", name);
                continue;
            }
        };

        results.insert(name.clone(), Vec::new());

        let request = Arc::clone(request);
        let name = name.clone();
        let timeout = config.timeout;
        let retry = config.retry;

        tasks.spawn(async move {
            let outcome =
                tokio::time::timeout(timeout, acquire_with_retry(&*source, &request, retry)).await;
            (name, outcome)
        });
    }

    let timeout_ms = config.timeout.as_millis() as u64;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(Ok(hits)))) => {
                debug!("Fan-out: {} returned {} hits", name, hits.len());
                results.insert(name, hits);
            }
            Ok((name, Ok(Err(err)))) => {
                error!("Fan-out: {} failed: {}", name, err);
            }
            Ok((name, Err(_elapsed))) => {
                warn!("Fan-out: {} timed out after {}ms", name, timeout_ms);
            }
            Err(join_err) => {
                error!("Fan-out: source task aborted: {}", join_err);
            }
        }
    }

    results
}

/// Attempt `acquire` up to `retry + 1` times with exponential backoff.
///
/// Backoff sleeps count against the shared deadline enforced by the
/// caller's timeout wrapper, so a heavily-retried source cannot extend the
/// overall request.
async fn acquire_with_retry(
    source: &dyn RecallSource,
    request: &RecallRequest,
    retry: u32,
) -> Result<Vec<RecallHit>> {
    let mut attempt = 0;
    loop {
        match source.acquire(request).await {
            Ok(hits) => return Ok(hits),
            Err(err) if attempt < retry => {
                warn!(
                    "Source {} failed (attempt {}), retrying: {}",
                    source.source_name(),
                    attempt + 1,
                    err
                );
                tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt)).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    "Source {} failed after {} attempts: {}",
                    source.source_name(),
                    attempt + 1,
                    err
                );
                return Err(err);
            }
        }
    }
}
