//! Integration tests for `Dispatcher` over `HyperTransport`, using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert2::{check, let_assert};
use courier::retry::DefaultRetryPolicy;
use courier::{
    CancelSignal, Dispatcher, ErrorKind, HyperTransport, Method, Outcome, Request, Transport,
};
use serde::{Deserialize, Serialize};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

fn dispatcher_for(server: &MockServer) -> courier::DispatcherBuilder {
    let base = url::Url::parse(&format!("{}/", server.uri())).expect("url");
    Dispatcher::builder().base_url(base)
}

#[tokio::test]
async fn test_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1, "name": "Alice"})),
        )
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).build();
    let outcome = dispatcher.get("users/1").await.expect("valid url");

    let_assert!(Outcome::Success(response) = outcome);
    check!(response.status() == 200);
    let user: User = response.json().expect("json");
    check!(
        user == User {
            id: 1,
            name: "Alice".to_string()
        }
    );
}

#[tokio::test]
async fn test_post_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"id": 2, "name": "Bob"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 2, "name": "Bob"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).build();
    let user = User {
        id: 2,
        name: "Bob".to_string(),
    };
    let outcome = dispatcher.post_json("users", &user).await.expect("valid url");

    let response = outcome.into_result().expect("success");
    check!(response.status() == 201);
}

#[tokio::test]
async fn test_put_patch_delete() {
    let mock_server = MockServer::start().await;

    for verb in ["PUT", "PATCH", "DELETE"] {
        Mock::given(method(verb))
            .and(path("/users/3"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let dispatcher = dispatcher_for(&mock_server).build();
    let user = User {
        id: 3,
        name: "Carol".to_string(),
    };

    check!(dispatcher.put_json("users/3", &user).await.expect("url").is_success());
    check!(dispatcher.patch_json("users/3", &user).await.expect("url").is_success());
    check!(dispatcher.delete("users/3").await.expect("url").is_success());
}

#[tokio::test]
async fn test_not_found_is_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).with_retry(3).build();
    let outcome = dispatcher.get("missing").await.expect("valid url");

    let_assert!(Outcome::TransportError(err) = &outcome);
    check!(err.kind() == ErrorKind::HttpStatus(404));
    let_assert!(Some(response) = err.response());
    check!(response.text().expect("utf-8") == "no such thing");

    let_assert!(Err(error) = outcome.into_result());
    check!(error.status() == Some(404));
    check!(error.is_client_error());
}

#[tokio::test]
async fn test_server_error_is_retried_up_to_ceiling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/unstable"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).with_retry(2).build();
    let outcome = dispatcher.get("unstable").await.expect("valid url");

    check!(outcome.error_kind() == Some(ErrorKind::HttpStatus(500)));
    check!(dispatcher.cache().is_empty());
}

#[tokio::test]
async fn test_repeated_get_is_served_from_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"v": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).build();
    for _ in 0..3 {
        let outcome = dispatcher.get("config").await.expect("valid url");
        check!(outcome.is_success());
    }
}

#[tokio::test]
async fn test_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).build();
    let request = Request::builder(Method::Get, dispatcher.url("search").expect("url"))
        .query("q", "rust")
        .query("page", "1")
        .build();

    check!(dispatcher.send(request).await.is_success());
}

#[tokio::test]
async fn test_bearer_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .and(header("Authorization", "Bearer my-secret-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server)
        .with_logging()
        .with_bearer_auth("my-secret-token")
        .build();

    check!(dispatcher.get("protected").await.expect("url").is_success());
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).build();
    let request = Request::builder(Method::Get, dispatcher.url("slow").expect("url"))
        .timeout(Duration::from_millis(100))
        .build();

    let outcome = dispatcher.send(request).await;

    check!(outcome.error_kind() == Some(ErrorKind::Timeout));
    let_assert!(Err(error) = outcome.into_result());
    check!(error.is_timeout());
}

#[tokio::test]
async fn test_default_timeout_from_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server)
        .timeout(Duration::from_millis(100))
        .build();

    let outcome = dispatcher.get("slow").await.expect("url");
    check!(outcome.error_kind() == Some(ErrorKind::Timeout));
}

#[tokio::test]
async fn test_cancel_in_flight() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let dispatcher = dispatcher_for(&mock_server).build();
    let signal = CancelSignal::new();
    let request = Request::builder(Method::Get, dispatcher.url("slow").expect("url"))
        .cancel_signal(signal.clone())
        .build();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        signal.cancel();
    });
    let outcome = dispatcher.send(request).await;
    canceller.await.expect("canceller");

    check!(outcome.is_cancelled());
    check!(dispatcher.cache().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on the discard port
    let url = url::Url::parse("http://127.0.0.1:9/").expect("url");
    let request = Request::builder(Method::Get, url).build();

    let outcome = HyperTransport::new()
        .execute(&request, Duration::from_secs(5))
        .await;

    check!(outcome.error_kind() == Some(ErrorKind::Network));
}

#[tokio::test]
async fn test_invalid_path_is_an_error() {
    let dispatcher = Dispatcher::new();
    let_assert!(Err(error) = dispatcher.get("relative/without/base").await);
    check!(error.to_string().contains("URL"));
}

/// Counts the calls reaching the real transport.
#[derive(Debug, Clone, Default)]
struct CountingTransport {
    inner: HyperTransport,
    calls: Arc<AtomicUsize>,
}

impl Transport for CountingTransport {
    async fn execute(&self, request: &Request, timeout: Duration) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(request, timeout).await
    }
}

#[tokio::test]
async fn test_malformed_request_is_not_retried() {
    let transport = CountingTransport::default();
    let dispatcher = Dispatcher::builder()
        .transport(transport.clone())
        .retry_policy(DefaultRetryPolicy::new(3).retry_on_network(true))
        .build();

    let url = url::Url::parse("http://127.0.0.1:9/").expect("url");
    let request = Request::builder(Method::Get, url)
        .header("bad header", "v")
        .build();
    let outcome = dispatcher.send(request).await;

    check!(outcome.error_kind() == Some(ErrorKind::InvalidRequest));
    check!(transport.calls.load(Ordering::SeqCst) == 1);
    let_assert!(Err(error) = outcome.into_result());
    check!(error.to_string().starts_with("invalid request"));
}
