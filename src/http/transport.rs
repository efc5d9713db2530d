//! The network seam under the guard.
//!
//! `ReqwestTransport` is the production implementation; tests substitute
//! their own to count calls or inject failures.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::http::request::FetchOptions;

/// A response whose body has been read in full.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Errors that occur before a complete response is available.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),

    /// Response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The per-call deadline expired.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Executes one HTTP exchange.
pub trait HttpTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        url: &'a Url,
        options: &'a FetchOptions,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        url: &'a Url,
        options: &'a FetchOptions,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        async move {
            let mut headers = HeaderMap::new();
            for (name, value) in &options.headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| TransportError::Request(format!("invalid header '{}': {}", name, e)))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| TransportError::Request(format!("invalid value for '{}': {}", name, e)))?;
                headers.insert(name, value);
            }

            let mut request = self
                .client
                .request(options.effective_method().as_reqwest(), url.clone())
                .headers(headers);
            if let Some(body) = &options.body {
                request = request.body(body.clone());
            }

            let response = request
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?
                .to_vec();

            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        }
        .boxed()
    }
}
