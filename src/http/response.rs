//! Responses handed back by the guard.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::transport::TransportResponse;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct GuardedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    source: ResponseSource,
}

impl GuardedResponse {
    pub fn from_network(response: TransportResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
            source: ResponseSource::Network,
        }
    }

    /// Synthesize a 200 JSON response from a cached payload.
    pub fn from_cache(data: &Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status: StatusCode::OK,
            headers,
            body: serde_json::to_vec(data).unwrap_or_default(),
            source: ResponseSource::Cache,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn source(&self) -> ResponseSource {
        self.source
    }

    pub fn is_cached(&self) -> bool {
        self.source == ResponseSource::Cache
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cached_response_is_ok_json() {
        let response = GuardedResponse::from_cache(&json!({"id": 7}));
        assert!(response.is_success());
        assert!(response.is_cached());
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.json::<Value>().unwrap(), json!({"id": 7}));
    }

    #[test]
    fn test_network_response_keeps_status_and_body() {
        let response = GuardedResponse::from_network(TransportResponse {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: b"missing".to_vec(),
        });
        assert!(!response.is_success());
        assert_eq!(response.source(), ResponseSource::Network);
        assert_eq!(response.text(), "missing");
    }
}
