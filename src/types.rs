//! Core types for footdata-dl

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::Error;

/// A player page URL — the unit of remote work.
///
/// The URL string is opaque to this crate; the only ordering that matters is a
/// URL's position in the input list, which is what resume markers refer to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerUrl(pub String);

impl PlayerUrl {
    /// Create a new PlayerUrl
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Get the URL as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PlayerUrl {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<&str> for PlayerUrl {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

impl std::fmt::Display for PlayerUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of retrieved player-match data, kept exactly as the service
/// returned it (no field renaming, no URL back-reference).
pub type PlayerRecord = serde_json::Map<String, serde_json::Value>;

/// An EPL season, spanning two consecutive calendar years (e.g. `2014-2015`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season {
    first_year: u16,
}

impl Season {
    /// Create a season from its first calendar year (`2014` → `2014-2015`).
    pub fn from_first_year(first_year: u16) -> Self {
        Self { first_year }
    }

    /// The first calendar year of the season
    pub fn first_year(&self) -> u16 {
        self.first_year
    }

    /// The second calendar year of the season
    pub fn second_year(&self) -> u16 {
        self.first_year + 1
    }

    /// The season containing today's date.
    ///
    /// Seasons run across the new year; a date before July belongs to the
    /// season that started the previous calendar year.
    pub fn current() -> Self {
        let today = Utc::now().date_naive();
        let first_year = if today.month() < 7 {
            today.year() - 1
        } else {
            today.year()
        };
        Self {
            first_year: first_year as u16,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first_year, self.first_year + 1)
    }
}

impl std::str::FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::Season {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (first, second) = s
            .split_once('-')
            .ok_or_else(|| invalid("expected two years separated by a dash (e.g. 2014-2015)"))?;
        let first: u16 = first
            .parse()
            .map_err(|_| invalid("first year is not a number"))?;
        let second: u16 = second
            .parse()
            .map_err(|_| invalid("second year is not a number"))?;

        if second != first + 1 {
            return Err(invalid("years must be consecutive (e.g. 2014-2015)"));
        }

        Ok(Self { first_year: first })
    }
}

impl TryFrom<String> for Season {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

/// Outcome of one orchestrator run.
///
/// On a clean run `resume_from` is `None` and `records` holds every batch's
/// rows in batch order. On a domain abort, `records` and `skipped` hold the
/// progress from the batches that completed, and `resume_from` names the
/// first URL of the batch that did not.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Retrieved records, in batch order
    pub records: Vec<PlayerRecord>,
    /// URLs the service explicitly declined to resolve
    pub skipped: BTreeSet<PlayerUrl>,
    /// First unattempted URL, set only when the run aborted
    pub resume_from: Option<PlayerUrl>,
}

/// Counts returned by a save operation, after merging with prior output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records retrieved by this run
    pub new_records: usize,
    /// Records in the output file after merging
    pub total_records: usize,
    /// URLs in the reconciled skip-state after this run
    pub skipped: usize,
    /// First unattempted URL, set only when the run aborted
    pub resume_from: Option<PlayerUrl>,
}

/// Event emitted during a fetch run
///
/// Events are informational only; they never affect control flow. Consumers
/// subscribe via [`crate::FootdataDownloader::subscribe`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Player URLs collected for a season range
    UrlsCollected {
        /// First season of the range
        start_season: Season,
        /// Last season of the range
        end_season: Season,
        /// Number of URLs collected
        count: usize,
    },

    /// A batch request is about to be sent
    BatchStarted {
        /// Zero-based batch sequence number
        index: usize,
        /// Total number of batches in this run
        total: usize,
        /// Number of URLs in this batch
        size: usize,
    },

    /// A batch request completed successfully
    BatchCompleted {
        /// Zero-based batch sequence number
        index: usize,
        /// Records returned by this batch
        records: usize,
        /// URLs the service reported skipped in this batch
        skipped: usize,
    },

    /// Every batch completed; no resume marker
    RunCompleted {
        /// Number of batches processed
        batches: usize,
        /// Total records accumulated
        records: usize,
        /// Total skip entries accumulated
        skipped: usize,
    },

    /// The run stopped at a batch boundary; progress so far is preserved
    RunAborted {
        /// Zero-based sequence number of the batch that did not complete
        batch_index: usize,
        /// First URL of the aborted batch — where the next run resumes
        resume_from: PlayerUrl,
        /// The service's stated reason, or "run cancelled"
        reason: String,
    },

    /// Output and skip-state written to disk
    Persisted {
        /// Path of the consolidated output file
        output_path: PathBuf,
        /// Records added by this run
        new_records: usize,
        /// Records in the output file after merging
        total_records: usize,
        /// URLs remaining in skip-state
        pending_skips: usize,
    },
}
