//! Batch dispatch engine.
//!
//! # Responsibilities
//! - Run N independent sub-requests under a fixed concurrency bound
//! - Apply the retry policy around the executor, per item
//! - Assemble results at their original input index
//! - Isolate item-level faults from the batch and from sibling items
//!
//! # Design Decisions
//! - Fixed worker pool over a shared atomic cursor, not one task per item;
//!   the pool stays saturated instead of idling at chunk boundaries
//! - The cursor is the only cross-worker mutable state; no lock is held
//!   across an await
//! - An item fault becomes a status-500 result, never a batch failure

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tokio::sync::mpsc;

use crate::config::DispatchConfig;
use crate::dispatch::executor;
use crate::dispatch::types::{BatchItem, BatchResult};
use crate::upstream::UpstreamChannel;

/// Dispatch a batch of sub-requests and return one result per item, in the
/// original input order.
///
/// Never fails for an individual item: validation errors, timeouts,
/// transport faults and internal faults all come back as data.
pub async fn dispatch(
    items: Vec<BatchItem>,
    config: &DispatchConfig,
    channel: Arc<UpstreamChannel>,
) -> Vec<BatchResult> {
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let started = Instant::now();
    let items = Arc::new(items);
    let cursor = Arc::new(AtomicUsize::new(0));
    let worker_count = (config.max_concurrency.max(1)).min(total);
    let (result_tx, mut result_rx) = mpsc::channel::<(usize, BatchResult)>(total);

    let mut workers = Vec::with_capacity(worker_count);
    for worker in 0..worker_count {
        let items = Arc::clone(&items);
        let cursor = Arc::clone(&cursor);
        let channel = Arc::clone(&channel);
        let config = config.clone();
        let result_tx = result_tx.clone();

        workers.push(tokio::spawn(async move {
            loop {
                // Claim the next unprocessed index. fetch_add is the only
                // cross-worker coordination; no index is ever claimed twice.
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= items.len() {
                    break;
                }

                let item = &items[index];
                let outcome = AssertUnwindSafe(run_item(item, &config, &channel))
                    .catch_unwind()
                    .await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::error!(
                            worker,
                            index,
                            request_id = %item.result_key(),
                            "Item processing panicked; isolating as internal error"
                        );
                        BatchResult::internal(item.result_key())
                    }
                };

                metrics::counter!(
                    "gateway_items_total",
                    "status" => result.status.to_string()
                )
                .increment(1);

                if result_tx.send((index, result)).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(result_tx);

    let mut slots: Vec<Option<BatchResult>> = (0..total).map(|_| None).collect();
    while let Some((index, result)) = result_rx.recv().await {
        slots[index] = Some(result);
    }

    for worker in workers {
        if let Err(error) = worker.await {
            tracing::error!(error = %error, "Dispatch worker terminated abnormally");
        }
    }

    metrics::histogram!("gateway_batch_duration_seconds").record(started.elapsed().as_secs_f64());
    tracing::debug!(
        items = total,
        workers = worker_count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch dispatch complete"
    );

    // A worker that died abnormally leaves its claimed slot empty; the
    // result-per-item invariant still has to hold.
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| BatchResult::internal(items[index].result_key())))
        .collect()
}

/// Execute one item, retrying rate-limited attempts per the policy.
///
/// The attempt counter is threaded explicitly; terminal results (including
/// a retry-exhausted 429) are surfaced verbatim.
async fn run_item(
    item: &BatchItem,
    config: &DispatchConfig,
    channel: &UpstreamChannel,
) -> BatchResult {
    let mut retries_done = 0u32;
    loop {
        let result = executor::execute(item, config, channel).await;
        if !config.retry.should_retry(result.status, retries_done) {
            return result;
        }

        let next_retry = retries_done + 1;
        let delay = config.retry.delay_for(next_retry);
        tracing::debug!(
            request_id = %item.result_key(),
            status = result.status,
            retry = next_retry,
            delay_ms = delay.as_millis() as u64,
            "Retrying rate-limited sub-request"
        );
        tokio::time::sleep(delay).await;
        retries_done = next_retry;
    }
}
