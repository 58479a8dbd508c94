//! reqwest-based [`Transport`] talking to the backend's JSON and SSE endpoints.

use super::sse::SseDecoder;
use super::{Frame, ProgressSubscription, StreamHandle, Transport};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::request::DownloadRequest;
use crate::types::{ValidationResponse, VideoMetadata};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

const VALIDATE_PATH: &str = "api/validate";
const METADATA_PATH: &str = "api/metadata";
const DOWNLOAD_PATH: &str = "api/download";

#[derive(Serialize)]
struct UrlBody<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// HTTP client for the backend service
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    frame_buffer: usize,
}

impl HttpTransport {
    /// Build a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the backend URL is invalid and `Error::Network` if the
    /// HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut base = config.backend.base_url.clone();
        // Url::join replaces the last segment unless the base ends with a slash
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| Error::Config {
            message: format!("invalid backend URL '{}': {}", base, e),
            key: Some("backend.base_url".to_string()),
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.backend.connect_timeout)
            .user_agent(config.backend.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url,
            request_timeout: config.backend.request_timeout,
            frame_buffer: config.stream.frame_buffer,
        })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of the progress subscription for `request`
    pub fn progress_url(&self, request: &DownloadRequest) -> Result<Url> {
        let mut endpoint = self.endpoint(DOWNLOAD_PATH)?;
        endpoint.query_pairs_mut().extend_pairs(
            request
                .query_pairs()
                .iter()
                .map(|(key, value)| (*key, value.as_str())),
        );
        Ok(endpoint)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| Error::Config {
            message: format!("cannot build endpoint '{}': {}", path, e),
            key: Some("backend.base_url".to_string()),
        })
    }

    async fn post_url(
        &self,
        operation: &'static str,
        path: &str,
        url: &str,
    ) -> Result<reqwest::Response> {
        let endpoint = self.endpoint(path)?;

        self.client
            .post(endpoint.clone())
            .timeout(self.request_timeout)
            .json(&UrlBody { url })
            .send()
            .await
            .map_err(|e| Error::Transport {
                operation,
                message: describe_request_error(&e, &endpoint, self.request_timeout),
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn validate(&self, url: &str) -> Result<ValidationResponse> {
        let operation = "validate";
        let response = self.post_url(operation, VALIDATE_PATH, url).await?;

        let status = response.status();
        if !status.is_success() {
            let message = read_detail(response)
                .await
                .unwrap_or_else(|| "Failed to validate URL".to_string());
            tracing::warn!(url = %url, status = %status, error = %message, "validation call failed");
            return Err(Error::Transport { operation, message });
        }

        response
            .json::<ValidationResponse>()
            .await
            .map_err(|e| Error::Transport {
                operation,
                message: format!("invalid validation response: {}", e),
            })
    }

    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let operation = "fetch_metadata";
        let response = self.post_url(operation, METADATA_PATH, url).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let message = read_detail(response)
                .await
                .unwrap_or_else(|| "Video not found".to_string());
            return Err(Error::NotFound(message));
        }
        if !status.is_success() {
            let message = read_detail(response)
                .await
                .unwrap_or_else(|| "Failed to fetch metadata".to_string());
            tracing::warn!(url = %url, status = %status, error = %message, "metadata call failed");
            return Err(Error::Transport { operation, message });
        }

        response
            .json::<VideoMetadata>()
            .await
            .map_err(|e| Error::Transport {
                operation,
                message: format!("invalid metadata response: {}", e),
            })
    }

    fn open_progress_stream(&self, request: &DownloadRequest) -> Result<ProgressSubscription> {
        let endpoint = self.progress_url(request)?;
        let handle = StreamHandle::new();
        let token = handle.cancellation_token();
        let stream_id = handle.id();
        let (tx, rx) = mpsc::channel(self.frame_buffer);
        let client = self.client.clone();

        tracing::info!(stream_id = %stream_id, url = %request.source_url, "opening progress stream");

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(stream_id = %stream_id, "progress stream connection torn down");
                }
                _ = pump_frames(client, endpoint, tx) => {}
            }
        });

        Ok(ProgressSubscription { handle, frames: rx })
    }
}

/// Connect to the SSE endpoint and forward decoded messages until the body ends
async fn pump_frames(client: reqwest::Client, endpoint: Url, tx: mpsc::Sender<Frame>) {
    let response = match client
        .get(endpoint.clone())
        .header(header::ACCEPT, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let reason = if e.is_connect() {
                format!("could not connect to {}: {}", endpoint.path(), e)
            } else {
                format!("progress request failed: {}", e)
            };
            tx.send(Frame::Failed(reason)).await.ok();
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let reason = read_detail(response)
            .await
            .unwrap_or_else(|| format!("backend returned {}", status));
        tx.send(Frame::Failed(reason)).await.ok();
        return;
    }

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for message in decoder.push(&bytes) {
                    if !message.is_message() {
                        tracing::debug!(event = ?message.event, "skipping named server-sent event");
                        continue;
                    }
                    // Receiver gone means the reader stopped; nothing left to do
                    if tx.send(Frame::Data(message.data)).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tx.send(Frame::Failed(format!("progress stream interrupted: {}", e)))
                    .await
                    .ok();
                return;
            }
        }
    }

    decoder.finish();
    tx.send(Frame::Closed).await.ok();
}

/// Extract the `detail` field of an error body, if there is one
async fn read_detail(response: reqwest::Response) -> Option<String> {
    let body = response.json::<ErrorBody>().await.ok()?;
    match body.detail? {
        serde_json::Value::String(detail) if !detail.is_empty() => Some(detail),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        // e.g. FastAPI's structured validation errors
        other => Some(other.to_string()),
    }
}

fn describe_request_error(error: &reqwest::Error, endpoint: &Url, timeout: Duration) -> String {
    if error.is_timeout() {
        format!(
            "Timeout contacting backend at '{}' (exceeded {} seconds)",
            endpoint,
            timeout.as_secs()
        )
    } else if error.is_connect() {
        format!("Connection failed for backend at '{}': {}", endpoint, error)
    } else {
        format!("Request to backend at '{}' failed: {}", endpoint, error)
    }
}
