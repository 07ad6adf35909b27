//! Remote inference over captured frames
//!
//! Submits an encoded frame to the scorer/responder service and returns its
//! textual reply. One request per submission; retry policy, if any, belongs
//! to the caller's collaborators, never here.

use std::time::Duration;

use async_trait::async_trait;

use crate::vision::ImagePayload;
use crate::{Error, Result};

/// Default request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response body from the inference API
#[derive(serde::Deserialize)]
struct InferenceResponse {
    response: String,
}

/// Scores a frame and produces a textual response
#[async_trait]
pub trait Inference: Send + Sync {
    /// Submit one frame for inference
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`], [`Error::ServerError`], or
    /// [`Error::Timeout`]; never hangs past the configured deadline.
    async fn submit(&self, frame: &ImagePayload) -> Result<String>;
}

/// HTTP client for the inference service
#[derive(Debug)]
pub struct InferenceClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl InferenceClient {
    /// Create a client for the given endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is empty
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        if endpoint.is_empty() {
            return Err(Error::Config("inference endpoint required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout,
        })
    }

    async fn submit_inner(&self, frame: &ImagePayload) -> Result<String> {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(frame.bytes.clone())
                .file_name(frame.format.file_name())
                .mime_str(frame.format.mime())
                .map_err(|e| Error::Network(e.to_string()))?,
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "inference request failed");
                Error::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "inference API error");
            return Err(Error::ServerError(format!("{status}: {body}")));
        }

        let result: InferenceResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "malformed inference response");
            Error::ServerError(format!("malformed body: {e}"))
        })?;

        Ok(result.response)
    }
}

#[async_trait]
impl Inference for InferenceClient {
    async fn submit(&self, frame: &ImagePayload) -> Result<String> {
        tracing::debug!(
            bytes = frame.bytes.len(),
            endpoint = %self.endpoint,
            "submitting frame for inference"
        );

        let deadline = self.timeout;
        match tokio::time::timeout(deadline, self.submit_inner(frame)).await {
            Ok(result) => {
                if let Ok(text) = &result {
                    tracing::info!(response = %text, "inference complete");
                }
                result
            }
            Err(_) => {
                #[allow(clippy::cast_possible_truncation)]
                let elapsed_ms = deadline.as_millis() as u64;
                tracing::warn!(timeout_ms = elapsed_ms, "inference timed out");
                Err(Error::Timeout(elapsed_ms))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_endpoint_rejected() {
        let err = InferenceClient::new(String::new(), DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Reserved TEST-NET-1 address; connection refused or unroutable
        let client = InferenceClient::new(
            "http://192.0.2.1:9/inference".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();

        let frame = ImagePayload {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            format: crate::vision::FrameFormat::Jpeg,
            width: 1,
            height: 1,
        };

        let err = client.submit(&frame).await.unwrap_err();
        assert!(matches!(err, Error::Network(_) | Error::Timeout(_)));
        assert!(err.degrades_to_fallback());
    }
}
