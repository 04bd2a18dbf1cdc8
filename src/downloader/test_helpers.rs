//! Shared test helpers for creating FootdataDownloader instances in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::downloader::FootdataDownloader;
use crate::error::{Error, Result};
use crate::store::JsonStore;
use crate::transport::{DataService, ServiceResponse};
use crate::types::PlayerUrl;

/// A [`DataService`] that replays a scripted response per call, in order,
/// and records every request it receives.
pub(crate) struct ScriptedDataService {
    responses: Mutex<VecDeque<Result<ServiceResponse>>>,
    /// Every `(path, params)` pair received, in call order
    pub(crate) calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    /// Cancel this token after responding to the call with this zero-based
    /// index (for batch-boundary cancellation tests)
    pub(crate) cancel_after_call: Option<(usize, CancellationToken)>,
}

impl ScriptedDataService {
    pub(crate) fn new(responses: Vec<Result<ServiceResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            cancel_after_call: None,
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DataService for ScriptedDataService {
    async fn fetch(&self, path: &str, params: &[(String, String)]) -> Result<ServiceResponse> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((path.to_string(), params.to_vec()));
            calls.len() - 1
        };

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request #{} to {}", call_index + 1, path));

        if let Some((after, token)) = &self.cancel_after_call {
            if call_index == *after {
                token.cancel();
            }
        }

        response
    }
}

/// A payload response with `n` records labeled by `tag` and the given skips.
pub(crate) fn payload(tag: &str, n: usize, skipped: &[&str]) -> Result<ServiceResponse> {
    let records = (0..n)
        .map(|i| serde_json::json!({"row": format!("{}-{}", tag, i)}))
        .collect();
    Ok(ServiceResponse::Payload {
        records,
        skipped: skipped.iter().map(|u| PlayerUrl::new(*u)).collect(),
    })
}

/// A request-level decline.
pub(crate) fn declined(reason: &str) -> Result<ServiceResponse> {
    Ok(ServiceResponse::Declined {
        reason: reason.to_string(),
    })
}

/// A fatal transport error.
pub(crate) fn status_error(status: u16) -> Result<ServiceResponse> {
    Err(Error::Status {
        status,
        body: "upstream failure".to_string(),
    })
}

/// Helper to create a test FootdataDownloader over a scripted service.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(
    service: Arc<ScriptedDataService>,
    batch_size: usize,
) -> (FootdataDownloader, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.fetch.batch_size = batch_size;
    config.fetch.data_dir = temp_dir.path().join("data");
    std::fs::create_dir_all(&config.fetch.data_dir).unwrap();

    // Create broadcast channel
    let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

    let store = JsonStore::new(&config.fetch.data_dir);

    let downloader = FootdataDownloader {
        config: Arc::new(config),
        service,
        store,
        event_tx,
        cancel_token: CancellationToken::new(),
    };

    (downloader, temp_dir)
}

/// `n` sequential player URLs `u1..un`.
pub(crate) fn urls(n: usize) -> Vec<PlayerUrl> {
    (1..=n).map(|i| PlayerUrl::new(format!("u{}", i))).collect()
}
