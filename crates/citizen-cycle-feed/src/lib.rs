//! HTTP client for the Citizen Cycle shared feed.
//!
//! [`HttpFeed`] implements the core's
//! [`FeedSource`](citizen_cycle_core::feed::FeedSource) seam: `GET` of the
//! whole feed and `POST` of a single local report, both against the same
//! endpoint URL. Requests time out after [`REQUEST_TIMEOUT`]; the core
//! never sees a call that does not resolve.

use std::time::Duration;

use citizen_cycle_core::config::FeedConfig;
use citizen_cycle_core::feed::{FeedError, FeedSource};
use citizen_cycle_types::BroadcastPayload;
use tracing::debug;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remove every whitespace character (pasted URLs and tokens often carry
/// stray spaces or newlines).
fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Map a transport error to the core's error type.
fn transport(e: &reqwest::Error) -> FeedError {
    FeedError::Transport(e.to_string())
}

/// Fetch and post collaborator over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    endpoint: String,
    authorization: String,
}

impl HttpFeed {
    /// Build a client for the endpoint and token in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| transport(&e))?;
        Ok(Self::with_client(client, config))
    }

    /// Build a feed around an existing client.
    pub fn with_client(client: reqwest::Client, config: &FeedConfig) -> Self {
        Self {
            client,
            endpoint: strip_whitespace(&config.endpoint),
            authorization: strip_whitespace(&config.authorization),
        }
    }

    /// The endpoint requests go to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: reqwest::Method) -> Result<reqwest::RequestBuilder, FeedError> {
        if self.endpoint.is_empty() {
            return Err(FeedError::NotConfigured);
        }
        let builder = self.client.request(method, &self.endpoint);
        Ok(if self.authorization.is_empty() {
            builder
        } else {
            builder.header(reqwest::header::AUTHORIZATION, &self.authorization)
        })
    }
}

/// Turn a non-success status into an error.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FeedError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FeedError::Status {
            status: status.as_u16(),
        })
    }
}

impl FeedSource for HttpFeed {
    async fn fetch_all(&self) -> Result<String, FeedError> {
        let response = self
            .request(reqwest::Method::GET)?
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let body = check_status(response)?
            .text()
            .await
            .map_err(|e| transport(&e))?;
        debug!(bytes = body.len(), "fetched feed");
        Ok(body)
    }

    async fn post(&self, payload: &BroadcastPayload) -> Result<(), FeedError> {
        let response = self
            .request(reqwest::Method::POST)?
            .json(payload)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        check_status(response)?;
        debug!(world = %payload.world, distracted = payload.distracted, "posted report");
        Ok(())
    }
}
