//! Authentication flows end to end against a mock Xenqu server.

use super::common::*;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xenqu_api::auth::{AuthState, StrategyKind, WebFlowState, WebLogin};
use xenqu_api::{Authenticator, OAuth1Credentials, XenquConfig};

#[tokio::test]
async fn test_jwt_bearer_from_environment() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "t1", 1).await;

    let pem = TEST_KEY.replace('\n', "\\n");
    let base_url = server.uri();
    let config = XenquConfig::from_lookup(|name| match name {
        "XENQU_BASE_URL" => Some(base_url.clone()),
        "XENQU_CLIENT_ID" => Some(CLIENT_ID.to_string()),
        "XENQU_CLIENT_SECRET" => Some(CLIENT_SECRET.to_string()),
        "XENQU_SUPER_ADMIN_SUBSCRIBER" => Some("subscriber-1".to_string()),
        "XENQU_PRIVATE_KEY" => Some(pem.clone()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.strategy_kind(), StrategyKind::JwtBearer);

    let auth = Authenticator::from_config(&config).unwrap();
    let credentials = auth.authenticate().await.unwrap();

    assert_eq!(
        credentials,
        OAuth1Credentials::new(CLIENT_ID, CLIENT_SECRET, "t1", "t1-secret")
    );
    assert_eq!(auth.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_web_flow_legs_are_signed_with_the_right_secrets() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/request_token"))
        .and(signed_with(CLIENT_SECRET, ""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=req-token&oauth_token_secret=req-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/authenticate"))
        .and(signed_with("login-secret", ""))
        .and(body_string_contains("authenticator=openid"))
        .and(body_string_contains("provider=google"))
        .respond_with(ResponseTemplate::new(200).set_body_string("oauth_verifier=early"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/authorize"))
        .and(signed_with("login-secret", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string("oauth_verifier=verif-1"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .and(signed_with(CLIENT_SECRET, "req-secret"))
        .and(oauth_token_is("req-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=access-token&oauth_token_secret=access-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = Authenticator::from_config(&web_config(&server)).unwrap();
    assert_eq!(auth.strategy_kind(), StrategyKind::WebFlow);

    let login = WebLogin::openid("google", "id-token").with_client("login-client", "login-secret");
    let credentials = auth.login("https://app.example/callback", &login).await.unwrap();

    assert_eq!(
        credentials,
        OAuth1Credentials::new(CLIENT_ID, CLIENT_SECRET, "access-token", "access-secret")
    );
    assert_eq!(auth.web_flow_state().await, WebFlowState::AccessTokenObtained);
}

#[tokio::test]
async fn test_web_flow_out_of_order_is_usage_error() {
    let server = MockServer::start().await;
    let auth = Authenticator::from_config(&web_config(&server)).unwrap();
    let login = WebLogin::password("ada", "pw");

    assert!(auth.access_token("verifier").await.unwrap_err().is_usage_error());
    assert!(auth.authenticate_login("oob", &login).await.unwrap_err().is_usage_error());
    assert!(auth.authorize("oob", &login).await.unwrap_err().is_usage_error());
    assert_eq!(auth.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_resume_then_renew_web_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/renew_token"))
        .and(signed_with("other-secret", "old-secret"))
        .and(oauth_token_is("old-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=new-token&oauth_token_secret=new-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = Authenticator::from_config(&web_config(&server)).unwrap();
    let renewed = auth
        .resume(
            OAuth1Credentials::new("other-client", "other-secret", "old-token", "old-secret"),
            true,
        )
        .await
        .unwrap();

    assert_eq!(
        renewed,
        OAuth1Credentials::new("other-client", "other-secret", "new-token", "new-secret")
    );
}

#[tokio::test]
async fn test_rejected_token_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Authenticator::from_config(&jwt_config(&server)).unwrap();
    let err = auth.authenticate().await.unwrap_err();

    assert!(err.is_authentication_failed());
    assert_eq!(err.status(), Some(401));
    assert!(auth.current_credentials().is_none());
}
