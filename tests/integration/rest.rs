//! Signed resource calls and the one-shot re-authentication policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::common::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xenqu_api::auth::WebLogin;
use xenqu_api::rest::StatusKind;
use xenqu_api::XenquRestClient;

async fn authenticated_client(server: &MockServer) -> XenquRestClient {
    let client = XenquRestClient::from_config(&jwt_config(server)).unwrap();
    client.authenticator().authenticate().await.unwrap();
    client
}

#[tokio::test]
async fn test_signature_verifies_with_query_parameters() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "t1", 1).await;

    Mock::given(method("GET"))
        .and(path("/contacts"))
        .and(query_param("name", "Ada Lovelace"))
        .and(signed_with(CLIENT_SECRET, "t1-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;
    let contacts: Value = client
        .get("/contacts", &[("name", "Ada Lovelace"), ("limit", "5")])
        .await
        .unwrap();

    assert_eq!(contacts, json!([{"id": 1}]));
}

#[tokio::test]
async fn test_signature_is_checked_against_the_addressed_url() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "t1", 1).await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;
    let _: Value = client.get("/user", &[("fields", "id")]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = requests.iter().find(|r| r.url.path() == "/user").unwrap();

    assert_eq!(request_url(request), format!("{}/user?fields=id", server.uri()));
    assert!(signature_is_valid(request, CLIENT_SECRET, "t1-secret"));
    assert!(!signature_is_valid(request, CLIENT_SECRET, "wrong-secret"));
}

#[tokio::test]
async fn test_json_body_is_not_signed() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "t1", 1).await;

    Mock::given(method("PUT"))
        .and(path("/contacts/1"))
        .and(signed_with(CLIENT_SECRET, "t1-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;
    let result: Value = client
        .put("/contacts/1", &json!({"name": "Grace"}), &[])
        .await
        .unwrap();

    assert_eq!(result, json!({"ok": true}));
}

#[tokio::test]
async fn test_two_401s_fail_after_exactly_two_attempts() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "t1", 2).await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    client.add_error_handler("after-retry", move |err| {
        assert!(err.is_failed_after_retry());
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = client.get::<Value>("/user", &[]).await.unwrap_err();

    assert!(err.is_failed_after_retry());
    assert_eq!(err.status_kind(), Some(StatusKind::Unauthorized));
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_removed_handler_is_not_called() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "t1", 1).await;

    Mock::given(method("GET"))
        .and(path("/forms"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handle = client.add_error_handler("count", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    client.add_error_handler("panics", |_| panic!("observer failure"));

    let err = client.get::<Value>("/forms", &[]).await.unwrap_err();
    assert_eq!(err.status_kind(), Some(StatusKind::Forbidden));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(client.remove_error_handler(&handle));
    client.get::<Value>("/forms", &[]).await.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_spawned_requests_share_one_reauth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t1",
            "token_secret": "t1-secret"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "t2", "token_secret": "t2-secret"}))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(oauth_token_is("t1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(signed_with(CLIENT_SECRET, "t2-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(8)
        .mount(&server)
        .await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Value>("/user", &[]).await })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        assert_eq!(result.unwrap().unwrap()["id"], 1);
    }
}

#[tokio::test]
async fn test_web_flow_resource_401_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/request_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=req-token&oauth_token_secret=req-secret"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/authenticate"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("oauth_verifier=v1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=access-token&oauth_token_secret=access-secret"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/renew_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(signed_with(CLIENT_SECRET, "access-secret"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = XenquRestClient::from_config(&web_config(&server)).unwrap();
    client
        .authenticator()
        .login("oob", &WebLogin::password("ada", "pw"))
        .await
        .unwrap();

    let err = client.get::<Value>("/user", &[]).await.unwrap_err();

    assert!(err.is_resource_failure());
    assert!(!err.is_failed_after_retry());
    assert_eq!(err.status(), Some(401));
}
