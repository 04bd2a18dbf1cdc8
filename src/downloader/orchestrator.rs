//! The fetch orchestrator — drives the batch sequence, accumulates progress,
//! and converts a request-level decline into a resume marker.
//!
//! Batches run strictly in order, one transport call at a time. The upstream
//! failure mode is rate limiting, whose only remedy is "stop and try again
//! later", so concurrency would defeat the point and sequential processing
//! keeps the abort position unambiguous: when batch `i` is declined, every
//! URL before batch `i` was attempted exactly once and every URL from batch
//! `i` onward was not attempted at all.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::batch::split_into_batches;
use crate::error::{Error, Result};
use crate::transport::{DataService, ServiceResponse};
use crate::types::{Event, PlayerRecord, PlayerUrl, RunResult};

use super::{PLAYER_MATCH_DATA_PATH, PLAYER_URLS_PARAM};

/// Reason string used when a run is cancelled rather than declined.
pub(crate) const CANCELLED_REASON: &str = "run cancelled";

/// One batched fetch run over an ordered URL list.
pub(crate) struct FetchRun {
    pub(crate) service: Arc<dyn DataService>,
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    pub(crate) batch_size: usize,
    pub(crate) cancel_token: CancellationToken,
}

impl FetchRun {
    /// Fetch match data for every URL in `urls`, in batches, sequentially.
    ///
    /// Returns `Ok` with a [`RunResult`] both on a clean run and on a domain
    /// abort (the abort is encoded as `resume_from`, with all progress up to
    /// the aborted batch preserved). Returns `Err` only for transport
    /// failures and malformed responses, which invalidate the whole run.
    pub(crate) async fn fetch_all(&self, urls: &[PlayerUrl]) -> Result<RunResult> {
        let batches = split_into_batches(urls, self.batch_size);
        let total = batches.len();
        tracing::info!(
            urls = urls.len(),
            batches = total,
            batch_size = self.batch_size,
            "Starting batched fetch run"
        );

        // Explicit accumulator, updated only between transport calls
        let mut acc = RunResult::default();

        for batch in batches {
            // Cancellation is only observed at batch boundaries; a batch
            // either completes or never starts
            if self.cancel_token.is_cancelled() {
                return Ok(self.abort(acc, batch.index, batch.first_url(), CANCELLED_REASON));
            }

            self.emit(Event::BatchStarted {
                index: batch.index,
                total,
                size: batch.urls.len(),
            });

            let params: Vec<(String, String)> = batch
                .urls
                .iter()
                .map(|url| (PLAYER_URLS_PARAM.to_string(), url.as_str().to_string()))
                .collect();

            match self.service.fetch(PLAYER_MATCH_DATA_PATH, &params).await? {
                ServiceResponse::Payload { records, skipped } => {
                    let records = into_records(records)?;
                    tracing::debug!(
                        batch_index = batch.index,
                        records = records.len(),
                        skipped = skipped.len(),
                        "Batch completed"
                    );
                    self.emit(Event::BatchCompleted {
                        index: batch.index,
                        records: records.len(),
                        skipped: skipped.len(),
                    });
                    acc.records.extend(records);
                    acc.skipped.extend(skipped);
                }
                ServiceResponse::Declined { reason } => {
                    return Ok(self.abort(acc, batch.index, batch.first_url(), &reason));
                }
            }
        }

        tracing::info!(
            batches = total,
            records = acc.records.len(),
            skipped = acc.skipped.len(),
            "Fetch run completed"
        );
        self.emit(Event::RunCompleted {
            batches: total,
            records: acc.records.len(),
            skipped: acc.skipped.len(),
        });
        Ok(acc)
    }

    /// Stop the run at a batch boundary, preserving accumulated progress and
    /// recording where a future run should resume.
    fn abort(
        &self,
        mut acc: RunResult,
        batch_index: usize,
        resume_from: &PlayerUrl,
        reason: &str,
    ) -> RunResult {
        tracing::warn!(
            batch_index = batch_index,
            resume_from = %resume_from,
            reason = reason,
            records_so_far = acc.records.len(),
            "Fetch run stopped at batch boundary"
        );
        self.emit(Event::RunAborted {
            batch_index,
            resume_from: resume_from.clone(),
            reason: reason.to_string(),
        });
        acc.resume_from = Some(resume_from.clone());
        acc
    }

    fn emit(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine
        self.event_tx.send(event).ok();
    }
}

/// Convert raw service rows into records, rejecting non-object rows.
fn into_records(rows: Vec<serde_json::Value>) -> Result<Vec<PlayerRecord>> {
    rows.into_iter()
        .map(|row| match row {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::MalformedResponse {
                message: format!("player record is not a JSON object: {}", other),
            }),
        })
        .collect()
}

/// Reconcile persisted skip-state against a run's outcome.
///
/// The reconciled set is the union of:
/// - URLs the service reported skipped in batches that completed this run
///   (`run.skipped`), and
/// - prior skip entries that were never attempted this run, i.e. prior
///   entries at or after the resume marker in `pending`.
///
/// Prior entries that were attempted drop out (they either resolved or
/// reappear in `run.skipped`), and stale prior entries no longer in the
/// pending list drop out with them. Reconciling an already-reconciled set
/// against the same run yields the same set.
pub fn reconcile_skip_state(
    prior: &BTreeSet<PlayerUrl>,
    run: &RunResult,
    pending: &[PlayerUrl],
) -> BTreeSet<PlayerUrl> {
    let mut reconciled = run.skipped.clone();

    if let Some(marker) = &run.resume_from {
        if let Some(pos) = pending.iter().position(|url| url == marker) {
            for url in &pending[pos..] {
                if prior.contains(url) {
                    reconciled.insert(url.clone());
                }
            }
        }
    }

    reconciled
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn urls(n: usize) -> Vec<PlayerUrl> {
        (1..=n).map(|i| PlayerUrl::new(format!("u{}", i))).collect()
    }

    fn skip_set(urls: &[&str]) -> BTreeSet<PlayerUrl> {
        urls.iter().map(|u| PlayerUrl::new(*u)).collect()
    }

    #[test]
    fn test_reconcile_clean_run_keeps_only_new_skips() {
        let prior = skip_set(&["u5", "u9"]);
        let run = RunResult {
            skipped: skip_set(&["u7"]),
            ..Default::default()
        };
        let pending = urls(10);

        // No resume marker: every prior entry was attempted, so only the
        // service-reported skips survive
        assert_eq!(reconcile_skip_state(&prior, &run, &pending), skip_set(&["u7"]));
    }

    #[test]
    fn test_reconcile_keeps_unattempted_prior_skips_on_abort() {
        let prior = skip_set(&["u2", "u8"]);
        let run = RunResult {
            skipped: skip_set(&["u3"]),
            resume_from: Some(PlayerUrl::new("u6")),
            ..Default::default()
        };
        let pending = urls(10);

        // u8 sits at or after the resume marker, so it was never attempted
        // and stays; u2 was attempted and drops out
        assert_eq!(
            reconcile_skip_state(&prior, &run, &pending),
            skip_set(&["u3", "u8"])
        );
    }

    #[test]
    fn test_reconcile_drops_stale_prior_entries() {
        let prior = skip_set(&["u5", "not-pending-anymore"]);
        let run = RunResult {
            resume_from: Some(PlayerUrl::new("u1")),
            ..Default::default()
        };
        let pending = urls(10);

        // The stale entry is in no batch, attempted or otherwise
        assert_eq!(reconcile_skip_state(&prior, &run, &pending), skip_set(&["u5"]));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let prior = skip_set(&["u2", "u8", "gone"]);
        let run = RunResult {
            skipped: skip_set(&["u3"]),
            resume_from: Some(PlayerUrl::new("u6")),
            ..Default::default()
        };
        let pending = urls(10);

        let once = reconcile_skip_state(&prior, &run, &pending);
        let twice = reconcile_skip_state(&once, &run, &pending);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_into_records_rejects_non_objects() {
        let rows = vec![serde_json::json!({"ok": true}), serde_json::json!("not a row")];
        match into_records(rows) {
            Err(Error::MalformedResponse { .. }) => {}
            other => panic!("expected MalformedResponse, got: {:?}", other),
        }
    }
}
