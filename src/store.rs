//! JSON-file persistence for player URLs, match data, and skip-state.
//!
//! The store owns the on-disk layout under the configured data directory and
//! the merge rules that make runs resumable:
//!
//! - Output files are **additive**: records retrieved by a new run are
//!   appended to whatever a previous run already saved, never overwriting it.
//! - Skip-state is **replaced** on every run with the reconciled set, and the
//!   file is deleted outright once nothing is left to skip.
//!
//! All files are pretty-printed JSON. serde_json writes UTF-8 verbatim, so
//! non-ASCII names and punctuation in player data survive byte-for-byte.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{PlayerRecord, PlayerUrl, Season};

/// File-based store for raw player data under a single data directory.
#[derive(Clone, Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at `data_dir`. The directory is created by
    /// [`crate::FootdataDownloader::new`], not here.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the player-URL list for a season range.
    pub fn player_urls_path(&self, start: &Season, end: &Season) -> PathBuf {
        self.data_dir
            .join(format!("epl-player-urls-{}-to-{}.json", start, end))
    }

    /// Path of the consolidated match-data output for a season range.
    pub fn match_data_path(&self, start: &Season, end: &Season) -> PathBuf {
        self.data_dir
            .join(format!("epl-player-match-data-{}-to-{}.json", start, end))
    }

    /// Path of the skip-state file carried across runs.
    pub fn skip_state_path(&self) -> PathBuf {
        self.data_dir.join("skipped-epl-player-urls.json")
    }

    /// Write a player-URL list as a pretty-printed JSON array.
    pub async fn save_player_urls(&self, path: &Path, urls: &[PlayerUrl]) -> Result<()> {
        write_pretty(path, urls).await
    }

    /// Load a player-URL list from a JSON array file.
    pub async fn load_player_urls(&self, path: &Path) -> Result<Vec<PlayerUrl>> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load persisted skip-state. A missing file means no pending skips.
    pub async fn load_skip_state(&self, path: &Path) -> Result<BTreeSet<PlayerUrl>> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Assemble the pending URL list for a run: the primary list with the
    /// persisted skip-state appended (deduplicated, primary order preserved),
    /// optionally truncated to start at `resume_from`.
    ///
    /// A resume marker that is not present in the pending list is logged and
    /// ignored — a stale marker must not silently drop work.
    pub async fn load_pending(
        &self,
        urls_path: &Path,
        skip_path: &Path,
        resume_from: Option<&PlayerUrl>,
    ) -> Result<Vec<PlayerUrl>> {
        let primary = self.load_player_urls(urls_path).await?;
        let skips = self.load_skip_state(skip_path).await?;

        let mut seen = BTreeSet::new();
        let mut pending = Vec::with_capacity(primary.len() + skips.len());
        for url in primary.into_iter().chain(skips) {
            if seen.insert(url.clone()) {
                pending.push(url);
            }
        }

        if let Some(marker) = resume_from {
            match pending.iter().position(|url| url == marker) {
                Some(pos) => {
                    tracing::info!(
                        resume_from = %marker,
                        position = pos,
                        remaining = pending.len() - pos,
                        "Resuming from previous run's marker"
                    );
                    pending.drain(..pos);
                }
                None => {
                    tracing::warn!(
                        resume_from = %marker,
                        "Resume marker not found in pending list, fetching the full list"
                    );
                }
            }
        }

        Ok(pending)
    }

    /// Persist a run's outcome: union `records` into any existing output at
    /// `output_path`, then replace the skip-state at `skip_path` with
    /// `skipped` (deleting the file when the set is empty).
    ///
    /// Returns the total record count in the output file after merging.
    pub async fn persist_run(
        &self,
        records: &[PlayerRecord],
        skipped: &BTreeSet<PlayerUrl>,
        output_path: &Path,
        skip_path: &Path,
    ) -> Result<usize> {
        let mut combined: Vec<PlayerRecord> = match tokio::fs::read_to_string(output_path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let prior = combined.len();
        combined.extend(records.iter().cloned());
        write_pretty(output_path, &combined).await?;

        if skipped.is_empty() {
            match tokio::fs::remove_file(skip_path).await {
                Ok(()) => {
                    tracing::info!(path = %skip_path.display(), "All skips resolved, skip-state removed");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            write_pretty(skip_path, skipped).await?;
        }

        tracing::info!(
            path = %output_path.display(),
            new_records = records.len(),
            prior_records = prior,
            total_records = combined.len(),
            pending_skips = skipped.len(),
            "Run persisted"
        );

        Ok(combined.len())
    }
}

async fn write_pretty<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
