//! Core downloader implementation.
//!
//! The [`FootdataDownloader`] facade wires the pieces together:
//! - [`orchestrator`] — the batched, resumable fetch loop (the core)
//! - [`crate::transport`] — one HTTP request per batch, injected as a capability
//! - [`crate::store`] — JSON-file persistence of output and skip-state

pub(crate) mod orchestrator;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::JsonStore;
use crate::transport::{DataService, HttpDataService, ServiceResponse};
use crate::types::{Event, PlayerUrl, RunResult, RunSummary, Season};

pub use orchestrator::reconcile_skip_state;

/// Service endpoint returning the player page URLs for a season range.
pub(crate) const PLAYER_URLS_PATH: &str = "/player_urls";
/// Service endpoint returning per-match data for a batch of player URLs.
pub(crate) const PLAYER_MATCH_DATA_PATH: &str = "/player_match_data";
/// Query parameter carrying one player URL; repeated per batch entry.
pub(crate) const PLAYER_URLS_PARAM: &str = "player_urls";

/// Main downloader instance (cloneable - all fields are Arc-wrapped or cheap)
#[derive(Clone)]
pub struct FootdataDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Data service capability (trait object for pluggable implementations)
    pub(crate) service: Arc<dyn DataService>,
    /// JSON-file store rooted at the configured data directory
    pub(crate) store: JsonStore,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Cancellation token observed between batches
    pub(crate) cancel_token: CancellationToken,
}

impl FootdataDownloader {
    /// Create a new FootdataDownloader instance
    ///
    /// Validates the configuration, creates the data directory, and builds
    /// the HTTP client for the configured data service.
    pub async fn new(config: Config) -> Result<Self> {
        let service = Arc::new(HttpDataService::new(&config.service)?);
        Self::with_service(config, service).await
    }

    /// Create an instance with a caller-supplied [`DataService`].
    ///
    /// The data source is an explicit capability, never resolved by name at
    /// runtime; tests and alternative backends inject their own
    /// implementation here.
    pub async fn with_service(config: Config, service: Arc<dyn DataService>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.fetch.data_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create data directory '{}': {}",
                        config.fetch.data_dir.display(),
                        e
                    ),
                ))
            })?;

        // Buffer enough events for a large run's batch notifications
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let store = JsonStore::new(&config.fetch.data_dir);

        Ok(Self {
            config: Arc::new(config),
            service,
            store,
            event_tx,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Subscribe to fetch events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently. Events are buffered, but a subscriber falling
    /// behind by more than 1000 events will receive a `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The store owning this downloader's on-disk layout.
    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Request that the current (and any future) run on this instance stop
    /// at the next batch boundary.
    ///
    /// No batch is interrupted mid-flight: the run finishes the in-flight
    /// request, then aborts with a resume marker exactly as for a service
    /// decline. Cancellation is sticky for this instance; construct a new
    /// instance for a fresh run.
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested, run will stop at the next batch boundary");
        self.cancel_token.cancel();
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Fetch the player page URLs for a season range.
    ///
    /// Seasons cover two calendar years, so both bounds have the
    /// `YYYY-YYYY` form (e.g. `2014-2015`). Unlike the batched match-data
    /// run, URL collection is a single request with no resume semantics; a
    /// service decline is surfaced as [`Error::Declined`].
    pub async fn fetch_player_urls(
        &self,
        start: &Season,
        end: &Season,
    ) -> Result<Vec<PlayerUrl>> {
        tracing::info!(start_season = %start, end_season = %end, "Fetching player URLs");

        let params = vec![
            ("start_season".to_string(), start.to_string()),
            ("end_season".to_string(), end.to_string()),
        ];

        match self.service.fetch(PLAYER_URLS_PATH, &params).await? {
            ServiceResponse::Payload { records, skipped } => {
                if !skipped.is_empty() {
                    tracing::warn!(
                        skipped = skipped.len(),
                        "Service reported skips while collecting player URLs"
                    );
                }
                let urls = records
                    .into_iter()
                    .map(|row| match row {
                        serde_json::Value::String(url) => Ok(PlayerUrl::new(url)),
                        other => Err(Error::MalformedResponse {
                            message: format!("player URL is not a string: {}", other),
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?;

                tracing::info!(count = urls.len(), "Player URLs received");
                self.emit_event(Event::UrlsCollected {
                    start_season: *start,
                    end_season: *end,
                    count: urls.len(),
                });
                Ok(urls)
            }
            ServiceResponse::Declined { reason } => Err(Error::Declined { reason }),
        }
    }

    /// Fetch and persist the player-URL list for the configured season range.
    ///
    /// Returns the path of the written file.
    pub async fn save_player_urls(&self) -> Result<PathBuf> {
        let start = self.config.seasons.start_season;
        let end = self.config.seasons.end_season;

        let urls = self.fetch_player_urls(&start, &end).await?;
        let path = self.store.player_urls_path(&start, &end);
        self.store.save_player_urls(&path, &urls).await?;

        tracing::info!(path = %path.display(), count = urls.len(), "Player URLs saved");
        Ok(path)
    }

    /// Fetch per-match data for `urls`, batched and resumable.
    ///
    /// This is the core operation: the list is split into batches of the
    /// configured size, fetched strictly in order, and a request-level
    /// decline stops the run at that batch boundary with all prior progress
    /// preserved in the returned [`RunResult`]. An empty `urls` yields an
    /// empty result without touching the service.
    pub async fn fetch_player_match_data(&self, urls: &[PlayerUrl]) -> Result<RunResult> {
        let run = orchestrator::FetchRun {
            service: Arc::clone(&self.service),
            event_tx: self.event_tx.clone(),
            batch_size: self.config.fetch.batch_size,
            cancel_token: self.cancel_token.clone(),
        };
        run.fetch_all(urls).await
    }

    /// Run a full fetch-and-persist cycle for the configured season range.
    ///
    /// Loads the pending URL list (the saved player-URL file plus any
    /// persisted skip-state, optionally truncated at `resume_from`), runs the
    /// batched fetch, merges the new records into the existing output file,
    /// and replaces the skip-state with the reconciled set.
    pub async fn save_player_match_data(
        &self,
        resume_from: Option<&PlayerUrl>,
    ) -> Result<RunSummary> {
        let start = self.config.seasons.start_season;
        let end = self.config.seasons.end_season;

        let urls_path = self.store.player_urls_path(&start, &end);
        let output_path = self.store.match_data_path(&start, &end);
        let skip_path = self.store.skip_state_path();

        let prior_skips = self.store.load_skip_state(&skip_path).await?;
        let pending = self
            .store
            .load_pending(&urls_path, &skip_path, resume_from)
            .await?;

        let result = self.fetch_player_match_data(&pending).await?;

        let reconciled = reconcile_skip_state(&prior_skips, &result, &pending);
        let total_records = self
            .store
            .persist_run(&result.records, &reconciled, &output_path, &skip_path)
            .await?;

        self.emit_event(Event::Persisted {
            output_path,
            new_records: result.records.len(),
            total_records,
            pending_skips: reconciled.len(),
        });

        Ok(RunSummary {
            new_records: result.records.len(),
            total_records,
            skipped: reconciled.len(),
            resume_from: result.resume_from,
        })
    }
}
