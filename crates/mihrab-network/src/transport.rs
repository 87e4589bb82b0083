//! HTTP abstraction for testability.
//!
//! Every outbound request in this crate goes through [`HttpTransport`], so the
//! fallback chain, the geocoder and the IP sensor can all be driven by
//! scripted transports in tests.

use std::future::Future;
use std::pin::Pin;

use mihrab_types::MihrabError;
use reqwest::header::ACCEPT;
use thiserror::Error;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a single request attempt did not yield a usable record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("Request timeout: API took too long to respond")]
    Timeout,

    #[error("Network/CORS error: {0}")]
    Network(String),

    #[error("API failed with status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Invalid JSON response: {0}")]
    MalformedBody(String),

    /// Parsed JSON that is not a successful timings payload.
    #[error("{0}")]
    InvalidPayload(String),
}

/// Asynchronous GET.
pub trait HttpTransport: Send + Sync {
    /// Performs a GET with `Accept: application/json`.
    ///
    /// Non-2xx statuses are returned as responses, not errors. Only failures
    /// to obtain a response at all map to `Timeout` or `Network`.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>>;
}

/// Real transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given `User-Agent`.
    ///
    /// # Errors
    /// Returns `NetworkError` if the TLS backend cannot be initialised.
    pub fn new(user_agent: &str) -> Result<Self, MihrabError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| MihrabError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn classify(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Network(e.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(classify)?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(classify)?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned outcomes in order and records every requested URL.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HttpResponse, TransportFailure>>>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<HttpResponse, TransportFailure>>) -> Self {
            Self { script: Mutex::new(script.into()), requests: Mutex::default() }
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpTransport for ScriptedTransport {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, TransportFailure>> {
            self.requests.lock().unwrap().push(url.to_string());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportFailure::Network("script exhausted".into())));
            Box::pin(async move { next })
        }
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            TransportFailure::Timeout.to_string(),
            "Request timeout: API took too long to respond"
        );
        assert_eq!(
            TransportFailure::Status { code: 503, body: "busy".into() }.to_string(),
            "API failed with status 503: busy"
        );
        assert!(TransportFailure::Network("refused".into()).to_string().starts_with("Network/CORS error"));
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_accept_header() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(418).set_body_string("teapot"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new("mihrab-test").unwrap();
        let response = transport.get(&format!("{}/ping", server.uri())).await.unwrap();
        assert_eq!(response.status, 418);
        assert_eq!(response.body, "teapot");
        assert!(!response.is_success());
    }
}
