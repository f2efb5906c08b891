//! HTTP transport using hyper-util and rustls.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tracing::trace;

use crate::{DispatcherConfig, Outcome, Request, Response, Transport};

/// Create an HTTPS connector with rustls.
///
/// Supports HTTP/1.1 and HTTP/2, with the Mozilla root certificates.
/// Plain `http://` URLs are allowed.
fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// [`Transport`] backed by a pooled hyper client.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&DispatcherConfig::default())
    }

    /// Create a transport using the connection settings of `config`.
    #[must_use]
    pub fn with_config(config: &DispatcherConfig) -> Self {
        let connector = https_connector(config.connect_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner }
    }

    /// Build a hyper request from a courier request.
    fn build_hyper_request(request: &Request) -> Result<http::Request<Full<Bytes>>, Outcome> {
        let mut builder = http::Request::builder()
            .method(http::Method::from(request.method()))
            .uri(request.effective_url().as_str());

        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = request.body().cloned().map_or_else(Full::default, Full::new);
        builder
            .body(body)
            .map_err(|e| Outcome::invalid_request(e.to_string()))
    }

    /// Extract response headers as a `HashMap`.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Outcome {
        if err.is_connect() {
            return Outcome::network(format!("connect: {err}"));
        }
        Outcome::network(err.to_string())
    }

    /// One round trip, without timeout or cancellation handling.
    async fn exchange(&self, request: &Request) -> Result<Response, Outcome> {
        let hyper_request = Self::build_hyper_request(request)?;

        let response = self
            .inner
            .request(hyper_request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Outcome::network(format!("reading body: {e}")))?
            .to_bytes();

        trace!(status, bytes = body.len(), "response received");
        Ok(Response::new(status, headers, body, request.clone()))
    }

    async fn exchange_with_timeout(&self, request: &Request, timeout: Duration) -> Outcome {
        match tokio::time::timeout(timeout, self.exchange(request)).await {
            Err(_elapsed) => Outcome::timeout(timeout),
            Ok(Err(outcome)) => outcome,
            Ok(Ok(response)) => Outcome::from_response(response),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn execute(&self, request: &Request, timeout: Duration) -> Outcome {
        let Some(signal) = request.cancel_signal() else {
            return self.exchange_with_timeout(request, timeout).await;
        };
        if signal.is_cancelled() {
            return Outcome::Cancelled;
        }

        tokio::select! {
            biased;
            () = signal.cancelled() => Outcome::Cancelled,
            outcome = self.exchange_with_timeout(request, timeout) => outcome,
        }
    }
}
