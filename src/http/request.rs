//! Request options and per-call guard settings.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// HTTP method of a guarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// POST, PUT, PATCH and DELETE change server state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete
        )
    }

    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// What goes on the wire. Serialized into the cache key, so two calls that
/// differ only in headers or body never share an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchOptions {
    /// `None` behaves as GET.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and set a JSON content type.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    pub fn effective_method(&self) -> HttpMethod {
        self.method.unwrap_or(HttpMethod::Get)
    }

    /// Only GET, explicit or implied, may be served from cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(self.method, None | Some(HttpMethod::Get))
    }
}

/// Cache key for a call: the URL followed by the serialized options.
pub fn cache_key(url: &Url, options: &FetchOptions) -> String {
    let serialized = serde_json::to_string(options).unwrap_or_default();
    format!("{}{}", url, serialized)
}

/// Per-call guard behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchConfig {
    /// Serve from and populate the response cache.
    pub cache: bool,

    /// TTL for a populated entry; the guard's configured default when unset.
    pub cache_ttl: Option<Duration>,

    /// Neither consult nor update the circuit breaker.
    pub skip_circuit_breaker: bool,

    /// Deadline for the network call.
    pub timeout: Option<Duration>,
}

impl FetchConfig {
    pub fn cached() -> Self {
        Self {
            cache: true,
            ..Self::default()
        }
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = true;
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn skip_circuit_breaker(mut self) -> Self {
        self.skip_circuit_breaker = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
