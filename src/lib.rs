//! # footdata-dl
//!
//! Batched, resumable download library for football player-data services.
//!
//! ## Design Philosophy
//!
//! footdata-dl is designed to be:
//! - **Resumable** - A run that is rate-limited mid-way keeps everything it
//!   already retrieved and records exactly where the next run should restart
//! - **Sequential by design** - Batches are fetched one at a time; the remedy
//!   for the service's failure mode is "stop and come back later", which
//!   concurrency would only defeat
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to progress events, no polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use footdata_dl::{Config, FootdataDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = FootdataDownloader::new(Config::default()).await?;
//!
//!     // Subscribe to progress events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Collect player page URLs, then fetch match data in batches
//!     downloader.save_player_urls().await?;
//!     let summary = downloader.save_player_match_data(None).await?;
//!
//!     if let Some(resume_from) = summary.resume_from {
//!         println!("Run stopped early, resume from {}", resume_from);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch splitting
pub mod batch;
/// Configuration types
pub mod config;
/// Core downloader implementation (facade + fetch orchestrator)
pub mod downloader;
/// Error types
pub mod error;
/// JSON-file persistence
pub mod store;
/// Data service transport
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use batch::{Batch, split_into_batches};
pub use config::{Config, FetchConfig, SeasonConfig, ServiceConfig};
pub use downloader::{FootdataDownloader, reconcile_skip_state};
pub use error::{Error, Result};
pub use store::JsonStore;
pub use transport::{DataService, HttpDataService, ServiceResponse};
pub use types::{Event, PlayerRecord, PlayerUrl, RunResult, RunSummary, Season};
