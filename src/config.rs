//! Configuration types for footdata-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::types::Season;

/// Data service connection configuration
///
/// Groups settings for reaching the player-data service.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the data service (default: "http://futbol_data:8080")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Delay before the single retry on a non-200 response (default: 10s)
    ///
    /// The first call to the service in a while can time out because the
    /// container is still starting, so one retry after a fixed delay is
    /// built in. There is no further retry policy in this crate.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// Fetch behavior configuration (batching, data directory)
///
/// Groups settings related to how player data is fetched and stored.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Target number of player URLs per batch request (default: 50)
    ///
    /// The full URL set is split into batches of roughly this size; a single
    /// request for the whole set would be declined by the service.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Directory for raw data files (default: "./data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            data_dir: default_data_dir(),
        }
    }
}

/// Season range configuration
///
/// Bounds the seasons covered by URL collection and output file naming.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// First season to fetch (default: 2014-2015, the earliest the service covers)
    #[serde(default = "default_start_season")]
    pub start_season: Season,

    /// Last season to fetch (default: the season containing today's date)
    #[serde(default = "Season::current")]
    pub end_season: Season,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            start_season: default_start_season(),
            end_season: Season::current(),
        }
    }
}

/// Top-level configuration for [`crate::FootdataDownloader`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data service connection settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Fetch behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Season range settings
    #[serde(default)]
    pub seasons: SeasonConfig,
}

impl Config {
    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.batch_size == 0 {
            return Err(Error::config(
                "batch_size must be at least 1",
                "fetch.batch_size",
            ));
        }

        Url::parse(&self.service.base_url).map_err(|e| {
            Error::config(
                format!("base_url {:?} is not a valid URL: {}", self.service.base_url, e),
                "service.base_url",
            )
        })?;

        if self.seasons.end_season < self.seasons.start_season {
            return Err(Error::config(
                format!(
                    "end_season {} precedes start_season {}",
                    self.seasons.end_season, self.seasons.start_season
                ),
                "seasons.end_season",
            ));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "http://futbol_data:8080".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_batch_size() -> usize {
    50
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_start_season() -> Season {
    Season::from_first_year(2014)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch.batch_size, 50);
        assert_eq!(config.service.base_url, "http://futbol_data:8080");
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut config = Config::default();
        config.fetch.batch_size = 0;

        match config.validate() {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("fetch.batch_size"));
            }
            other => panic!("expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let mut config = Config::default();
        config.service.base_url = "not a url".to_string();

        match config.validate() {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("service.base_url"));
            }
            other => panic!("expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_reversed_season_range_is_rejected() {
        let mut config = Config::default();
        config.seasons.start_season = Season::from_first_year(2018);
        config.seasons.end_season = Season::from_first_year(2014);

        match config.validate() {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("seasons.end_season"));
            }
            other => panic!("expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"fetch": {"batch_size": 25}}"#).unwrap();
        assert_eq!(config.fetch.batch_size, 25);
        assert_eq!(config.fetch.data_dir, PathBuf::from("./data"));
        assert_eq!(config.service.base_url, "http://futbol_data:8080");
    }
}
