//! Trust propagation integration tests.
//!
//! Runs the QA service on its own and behind a real gateway to check that
//! only gateway-forwarded traffic is accepted.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use common::trust::{GATEWAY_SECRET_HEADER, USER_ID_HEADER};
use gateway_test_utils::{
    TestCredentialBuilder, TestGateway, TestQaService, TEST_GATEWAY_SECRET,
};

#[tokio::test]
async fn test_direct_call_without_secret_is_rejected() -> Result<()> {
    let qa = TestQaService::spawn().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/qa/whoami", qa.url()))
        .header(USER_ID_HEADER, "1")
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["code"], 401);

    Ok(())
}

#[tokio::test]
async fn test_direct_call_with_wrong_secret_is_rejected() -> Result<()> {
    let qa = TestQaService::spawn().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/qa/whoami", qa.url()))
        .header(GATEWAY_SECRET_HEADER, "not-the-secret")
        .send()
        .await?;

    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_direct_health_check_is_internal() -> Result<()> {
    let qa = TestQaService::spawn().await?;

    let response = reqwest::get(format!("{}/actuator/health", qa.url())).await?;

    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_direct_call_with_secret_is_accepted() -> Result<()> {
    let qa = TestQaService::spawn().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/test/ping", qa.url()))
        .header(GATEWAY_SECRET_HEADER, TEST_GATEWAY_SECRET)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["pong"], true);

    Ok(())
}

#[tokio::test]
async fn test_identity_flows_through_gateway() -> Result<()> {
    let qa = TestQaService::spawn().await?;
    let gateway = TestGateway::spawn(&qa.url()).await?;
    let token = TestCredentialBuilder::new().for_user("42", "alice").build();

    let response = reqwest::Client::new()
        .get(format!("{}/api/qa/whoami", gateway.url()))
        .bearer_auth(token)
        .header(USER_ID_HEADER, "1")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user_id"], "42");
    assert_eq!(body["user_name"], "alice");

    Ok(())
}

#[tokio::test]
async fn test_public_path_through_gateway_is_anonymous() -> Result<()> {
    let qa = TestQaService::spawn().await?;
    let gateway = TestGateway::spawn(&qa.url()).await?;

    let response = reqwest::get(format!("{}/api/test/ping", gateway.url())).await?;

    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_gateway_rejects_before_qa_service() -> Result<()> {
    let qa = TestQaService::spawn().await?;
    let gateway = TestGateway::spawn(&qa.url()).await?;

    let response = reqwest::get(format!("{}/api/qa/whoami", gateway.url())).await?;

    assert_eq!(response.status(), 401);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer realm=\"qa-platform\""
    );

    Ok(())
}
