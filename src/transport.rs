//! HTTP transport for the player-data service.
//!
//! The orchestrator consumes the [`DataService`] capability rather than a
//! concrete HTTP client, so tests (and alternative data sources) can inject
//! their own implementation. The production implementation,
//! [`HttpDataService`], performs one GET per call, parses the JSON envelope,
//! and retries exactly once after a fixed delay on a non-200 status: the
//! first call to the service in a while can time out while its container
//! starts.
//!
//! A request-level decline by the service (an `"error"` field in the body) is
//! returned as [`ServiceResponse::Declined`], not as an `Err` — the caller
//! branches on the tag. Only transport failures and malformed bodies are
//! errors.

use std::time::Duration;

use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::types::PlayerUrl;

/// Parsed response from the data service.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceResponse {
    /// The service answered the request.
    Payload {
        /// Rows returned by the service, uninterpreted
        records: Vec<Value>,
        /// URLs the service explicitly declined to resolve within an
        /// otherwise successful response
        skipped: Vec<PlayerUrl>,
    },
    /// The service declined the whole request (e.g. rate limiting).
    Declined {
        /// The service's stated reason
        reason: String,
    },
}

/// Abstraction over data-service requests, enabling testability.
#[async_trait::async_trait]
pub trait DataService: Send + Sync {
    /// Perform one request against the service.
    ///
    /// `params` are query parameters; repeated keys are allowed (a batch of
    /// player URLs is sent as repeated `player_urls` parameters).
    async fn fetch(&self, path: &str, params: &[(String, String)]) -> Result<ServiceResponse>;
}

/// Production [`DataService`] backed by reqwest.
pub struct HttpDataService {
    client: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

impl HttpDataService {
    /// Build a client from the service configuration.
    ///
    /// The base URL must already be validated (see [`crate::Config::validate`]).
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_delay: config.retry_delay,
        })
    }

    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<reqwest::Response> {
        let response = self.client.get(url).query(params).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        tracing::warn!(
            url = url,
            status = status,
            delay_ms = self.retry_delay.as_millis() as u64,
            "Bad status from data service, retrying once"
        );
        tokio::time::sleep(self.retry_delay).await;

        let retried = self.client.get(url).query(params).send().await?;
        if retried.status().is_success() {
            tracing::info!(url = url, "Data service request succeeded after retry");
            return Ok(retried);
        }

        let status = retried.status().as_u16();
        let body = retried.text().await.unwrap_or_default();
        Err(Error::Status { status, body })
    }
}

#[async_trait::async_trait]
impl DataService for HttpDataService {
    async fn fetch(&self, path: &str, params: &[(String, String)]) -> Result<ServiceResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.get(&url, params).await?;
        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        parse_envelope(value)
    }
}

/// Parse the service's JSON envelope into a tagged response.
///
/// Accepted shapes:
/// - `{"error": …}` — a request-level decline.
/// - `{"data": […], "skipped_urls": […]}` — records plus per-URL skips;
///   `skipped_urls` may be absent or the empty string (the service emits `""`
///   for "none").
/// - a bare JSON array — records with no skips (early service versions).
pub(crate) fn parse_envelope(value: Value) -> Result<ServiceResponse> {
    match value {
        Value::Object(map) => {
            if let Some(error) = map.get("error") {
                let reason = match error {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Ok(ServiceResponse::Declined { reason });
            }

            let Some(data) = map.get("data") else {
                return Err(Error::MalformedResponse {
                    message: "response object has neither \"data\" nor \"error\"".to_string(),
                });
            };
            let records = match data {
                Value::Array(items) => items.clone(),
                other => {
                    return Err(Error::MalformedResponse {
                        message: format!("\"data\" is not an array (got {})", json_kind(other)),
                    });
                }
            };

            let skipped = match map.get("skipped_urls") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::String(s)) if s.is_empty() => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(url) => Ok(PlayerUrl::new(url.clone())),
                        other => Err(Error::MalformedResponse {
                            message: format!(
                                "\"skipped_urls\" entry is not a string (got {})",
                                json_kind(other)
                            ),
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?,
                Some(other) => {
                    return Err(Error::MalformedResponse {
                        message: format!(
                            "\"skipped_urls\" is not an array (got {})",
                            json_kind(other)
                        ),
                    });
                }
            };

            Ok(ServiceResponse::Payload { records, skipped })
        }
        Value::Array(records) => Ok(ServiceResponse::Payload {
            records,
            skipped: Vec::new(),
        }),
        other => Err(Error::MalformedResponse {
            message: format!("response is neither object nor array (got {})", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
