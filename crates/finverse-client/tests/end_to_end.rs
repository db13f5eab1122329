//! Client behaviour over real HTTP against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use finverse_client::{
    ClientConfig, ErrorKind, FinverseClient, LinkTokenRequest, QueryFilter,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use transport::ReqwestTransport;

fn client_for(server: &ServerGuard) -> FinverseClient {
    let config = ClientConfig::new("client-1", "secret-1", "app-1")
        .with_base_url(server.url())
        .with_redirect_uri("https://app.test/callback")
        .with_timeout(Duration::from_secs(5));
    FinverseClient::new(&config).unwrap()
}

async fn mock_customer_token(server: &mut ServerGuard, token: &str) -> mockito::Mock {
    server
        .mock("POST", "/auth/customer/token")
        .match_header("content-type", "application/json")
        .match_header("x-customer-app-id", "app-1")
        .match_header("x-request-id", Matcher::Any)
        .match_body(Matcher::Json(json!({
            "client_id": "client-1",
            "client_secret": "secret-1",
            "grant_type": "client_credentials"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": token, "expires_in": 3600}).to_string())
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn first_call_fetches_one_token_then_reuses_it() {
    let mut server = Server::new_async().await;
    let token = mock_customer_token(&mut server, "svc-tok").await;
    let accounts = server
        .mock("GET", "/accounts")
        .match_header("authorization", "Bearer svc-tok")
        .match_header("x-customer-app-id", "app-1")
        .with_status(200)
        .with_body(r#"{"accounts":[{"account_id":"acc-1"}]}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let first = client.get_accounts().await.unwrap();
    let second = client.get_accounts().await.unwrap();

    assert_eq!(first["accounts"][0]["account_id"], "acc-1");
    assert_eq!(first, second);
    token.assert_async().await;
    accounts.assert_async().await;
}

#[tokio::test]
async fn concurrent_first_calls_share_one_refresh() {
    let mut server = Server::new_async().await;
    let token = mock_customer_token(&mut server, "svc-tok").await;
    let identity = server
        .mock("GET", "/identity")
        .match_header("authorization", "Bearer svc-tok")
        .with_status(200)
        .with_body(r#"{"identity":{}}"#)
        .expect(4)
        .create_async()
        .await;

    let client = Arc::new(client_for(&server));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = client.clone();
        handles.push(tokio::spawn(async move { client.get_identity().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    token.assert_async().await;
    identity.assert_async().await;
}

#[tokio::test]
async fn exchanged_user_token_is_used_afterwards() {
    let mut server = Server::new_async().await;
    let token = mock_customer_token(&mut server, "svc-tok").await;
    let exchange = server
        .mock("POST", "/auth/token")
        .match_header("authorization", "Bearer svc-tok")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "client-1".into()),
            Matcher::UrlEncoded("code".into(), "code-123".into()),
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("redirect_uri".into(), "https://app.test/callback".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"user-tok","token_type":"Bearer"}"#)
        .create_async()
        .await;
    let transactions = server
        .mock("GET", "/transactions")
        .match_header("authorization", "Bearer user-tok")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("account_ids".into(), "acc-1".into()),
            Matcher::UrlEncoded("start_date".into(), "2024-01-01".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"transactions":[]}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    client.exchange_authorization_code("code-123").await.unwrap();
    let filter = QueryFilter {
        account_ids: vec!["acc-1".into()],
        start_date: Some("2024-01-01".into()),
        end_date: None,
    };
    client.get_transactions(&filter).await.unwrap();

    token.assert_async().await;
    exchange.assert_async().await;
    transactions.assert_async().await;
}

#[tokio::test]
async fn link_token_is_posted_as_json() {
    let mut server = Server::new_async().await;
    let _token = mock_customer_token(&mut server, "svc-tok").await;
    let link = server
        .mock("POST", "/link/token")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "client_id": "client-1",
            "user_id": "user-9",
            "state": "state-xyz",
            "redirect_uri": "https://app.test/callback",
            "countries": ["SGP"]
        })))
        .with_status(200)
        .with_body(r#"{"link_url":"https://link.test/abc","access_token":"ignored"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let request = LinkTokenRequest::new("user-9", "state-xyz").with_countries(["SGP"]);
    let response = client.generate_link_token(&request).await.unwrap();

    assert_eq!(response["link_url"], "https://link.test/abc");
    assert!(!client.credentials().has_user_credential().await);
    link.assert_async().await;
}

#[tokio::test]
async fn error_responses_are_classified() {
    let cases = [
        (401, ErrorKind::Auth),
        (400, ErrorKind::InvalidRequest),
        (429, ErrorKind::RateLimit),
        (503, ErrorKind::Api),
    ];
    for (status, kind) in cases {
        let mut server = Server::new_async().await;
        let _token = mock_customer_token(&mut server, "svc-tok").await;
        let _accounts = server
            .mock("GET", "/accounts")
            .with_status(status as usize)
            .with_body(r#"{"message":"server says no","code":"E1"}"#)
            .create_async()
            .await;

        let err = client_for(&server).get_accounts().await.unwrap_err();
        assert_eq!(err.kind(), kind, "status {status}");
        assert_eq!(err.status_code(), Some(status));
        assert_eq!(err.message(), "server says no");
        assert_eq!(err.payload().unwrap()["code"], "E1");
    }
}

#[tokio::test]
async fn rejected_credentials_surface_as_auth_error() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/auth/customer/token")
        .with_status(401)
        .with_body(r#"{"message":"invalid client"}"#)
        .expect(2)
        .create_async()
        .await;
    let accounts = server
        .mock("GET", "/accounts")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    for _ in 0..2 {
        let err = client.get_accounts().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(err.message().contains("invalid client"), "got: {err}");
    }

    token.assert_async().await;
    accounts.assert_async().await;
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let mut server = Server::new_async().await;
    let _token = mock_customer_token(&mut server, "svc-tok").await;
    let _accounts = server
        .mock("GET", "/accounts")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client_for(&server).get_accounts().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    assert_eq!(err.status_code(), Some(200));
}

#[tokio::test]
async fn unreachable_server_is_transport_error_for_domain_calls() {
    let config = ClientConfig::new("client-1", "secret-1", "app-1")
        .with_base_url("http://127.0.0.1:1")
        .with_timeout(Duration::from_secs(5));
    let transport = Arc::new(ReqwestTransport::with_timeout(config.timeout()).unwrap());
    let client = FinverseClient::with_transport(&config, transport).unwrap();

    // the token refresh fails first, and refresh failures are Auth
    let err = client.get_accounts().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(err.message().contains("network"), "got: {err}");

    // without credentials in the way the raw transport failure shows through
    client.credentials().set_user_credential("user-tok").await;
    let err = client.get_accounts().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
