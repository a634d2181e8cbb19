//! HTTP transport abstraction and the per-source fetch context.
//!
//! Adapters never hold a raw `reqwest::Client`. They receive a
//! [`FetchContext`] which routes every request through the source's
//! shared [`RateGate`] and the configured timeout, and classifies
//! transport failures into typed [`FetchError`]s. Tests substitute the
//! [`HttpClient`] trait with recording or scripted implementations.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::FetchError;
use crate::throttling::RateGate;

/// Minimal HTTP method set needed by source adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request envelope handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    /// Zero means "inherit the context timeout".
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: 0,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("authorization", format!("Bearer {token}"))
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Response envelope returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure, before classification into a [`FetchError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    timed_out: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport contract implemented by the real client and by test doubles.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// No-op transport returning an empty record list, for offline tests.
#[derive(Debug, Default)]
pub struct NoopHttpClient;

impl HttpClient for NoopHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let _ = request;
        Box::pin(async move { Ok(HttpResponse::ok_json("[]")) })
    }
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent("aerofetch/0.1.0")
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
            };

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            if request.timeout_ms > 0 {
                builder = builder.timeout(Duration::from_millis(request.timeout_ms));
            }

            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(|error| {
                if error.is_timeout() {
                    HttpError::timed_out(format!("request timeout: {error}"))
                } else if error.is_connect() {
                    HttpError::new(format!("connection failed: {error}"))
                } else {
                    HttpError::new(format!("request failed: {error}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|error| HttpError::new(format!("failed to read response body: {error}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Everything an adapter needs to talk to its provider: the transport,
/// the source's shared rate gate, and the per-request timeout.
///
/// Built fresh for every source run and passed explicitly into the
/// adapter so fan-out sub-requests share one budget. There is no ambient
/// global client or limiter.
#[derive(Clone)]
pub struct FetchContext {
    http: Arc<dyn HttpClient>,
    gate: RateGate,
    request_timeout: Duration,
}

impl FetchContext {
    pub fn new(http: Arc<dyn HttpClient>, gate: RateGate, request_timeout: Duration) -> Self {
        Self {
            http,
            gate,
            request_timeout,
        }
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Execute one request through the gate with the configured timeout.
    ///
    /// Timeouts and connection failures come back retryable; the caller
    /// decides whether a non-2xx status is an error.
    pub async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.gate.acquire().await;

        if request.timeout_ms == 0 {
            request.timeout_ms = self.request_timeout.as_millis().min(u64::MAX as u128) as u64;
        }
        let url = request.url.clone();

        let outcome = tokio::time::timeout(self.request_timeout, self.http.execute(request)).await;
        match outcome {
            Err(_) => Err(FetchError::timeout(format!(
                "request to {url} exceeded {:?}",
                self.request_timeout
            ))),
            Ok(Err(error)) if error.is_timeout() => Err(FetchError::timeout(error.message())),
            Ok(Err(error)) => Err(FetchError::network(error.message())),
            Ok(Ok(response)) => Ok(response),
        }
    }

    /// GET a URL and parse the body as JSON.
    ///
    /// Non-2xx statuses are network errors (retryable); a body that is
    /// not JSON is a parse error (never retried).
    pub async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.execute(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(FetchError::network(format!(
                "upstream returned status {} for {url}",
                response.status
            )));
        }
        serde_json::from_str(&response.body)
            .map_err(|error| FetchError::parse(format!("malformed JSON body from {url}: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_populates_authorization_header() {
        let request = HttpRequest::get("https://example.test/data").with_bearer_token("token-123");
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer token-123")
        );
    }

    #[test]
    fn header_names_are_lowercased() {
        let request = HttpRequest::get("https://example.test/data").with_header("X-API-Key", "demo");
        assert_eq!(request.headers.get("x-api-key").map(String::as_str), Some("demo"));
    }

    #[tokio::test]
    async fn get_json_maps_bad_body_to_parse_error() {
        struct HtmlClient;

        impl HttpClient for HtmlClient {
            fn execute<'a>(
                &'a self,
                _request: HttpRequest,
            ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>
            {
                Box::pin(async move { Ok(HttpResponse::ok_json("<html>maintenance</html>")) })
            }
        }

        let cx = FetchContext::new(
            Arc::new(HtmlClient),
            RateGate::unlimited(),
            Duration::from_secs(5),
        );
        let error = cx
            .get_json("https://example.test/data")
            .await
            .expect_err("must fail");
        assert_eq!(error.code(), "fetch.parse");
        assert!(!error.retryable());
    }

    #[tokio::test]
    async fn get_json_maps_bad_status_to_network_error() {
        struct TeapotClient;

        impl HttpClient for TeapotClient {
            fn execute<'a>(
                &'a self,
                _request: HttpRequest,
            ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>
            {
                Box::pin(async move {
                    Ok(HttpResponse {
                        status: 503,
                        body: String::new(),
                    })
                })
            }
        }

        let cx = FetchContext::new(
            Arc::new(TeapotClient),
            RateGate::unlimited(),
            Duration::from_secs(5),
        );
        let error = cx
            .get_json("https://example.test/data")
            .await
            .expect_err("must fail");
        assert_eq!(error.code(), "fetch.network");
        assert!(error.retryable());
    }
}
