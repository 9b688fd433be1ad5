mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_confirm_and_login() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app.post("/api/auth/register", json!({ "email": "reader@example.com" })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let message: String = res.json().await?;
    assert_eq!(message, "Confirmation email sent to reader@example.com");

    let code = app.mailer.last_code_for("reader@example.com").expect("code sent");
    let res = app
        .post(
            "/api/auth/register/confirm",
            json!({ "confirmationCode": code, "username": "reader", "password": "pw" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let confirmed: Value = res.json().await?;
    assert_eq!(confirmed["username"], "reader");

    let res = app.post("/api/auth/login", json!({ "email": "reader@example.com", "password": "pw" })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = res.json().await?;
    assert_eq!(login["user"]["userId"], confirmed["userId"]);
    assert_eq!(login["user"]["email"], "reader@example.com");

    let jwt = login["jwt"].as_str().expect("jwt");
    let me: Value = app.get_as(jwt, "/api/user/me").await?.json().await?;
    assert_eq!(me["id"], confirmed["userId"]);
    Ok(())
}

#[tokio::test]
async fn confirmation_code_cannot_be_reused() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    app.register("once@example.com", "first").await?;

    let code = app.mailer.last_code_for("once@example.com").expect("code sent");
    let res = app
        .post(
            "/api/auth/register/confirm",
            json!({ "confirmationCode": code, "username": "second", "password": "pw" }),
        )
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let problem: Value = res.json().await?;
    assert_eq!(problem["title"], "Bad request");
    assert_eq!(problem["detail"], "Invalid confirmation code");
    Ok(())
}

#[tokio::test]
async fn expired_confirmation_code_is_rejected() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    app.post("/api/auth/register", json!({ "email": "late@example.com" })).await?;
    let code = app.mailer.last_code_for("late@example.com").expect("code sent");

    app.clock.advance(chrono::Duration::hours(25));
    let res = app
        .post(
            "/api/auth/register/confirm",
            json!({ "confirmationCode": code, "username": "tardy", "password": "pw" }),
        )
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let problem: Value = res.json().await?;
    assert_eq!(problem["detail"], "Confirmation code has expired");
    Ok(())
}

#[tokio::test]
async fn registering_a_taken_email_fails() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    app.register("taken@example.com", "owner").await?;

    let res = app.post("/api/auth/register", json!({ "email": "taken@example.com" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app.post("/api/auth/login", json!({ "email": "nobody@example.com", "password": "pw" })).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let problem: Value = res.json().await?;
    assert_eq!(problem["status"], 401);
    assert_eq!(problem["title"], "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn login_requires_email_and_password() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app.post("/api/auth/login", json!({ "email": "", "password": "" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.post("/api/auth/login", json!({ "email": "someone@example.com" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_and_malformed_bodies_are_bad_requests() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app
        .post("/api/auth/register", json!({ "email": "x@example.com", "admin": true }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .post(app.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let problem: Value = res.json().await?;
    assert_eq!(problem["type"], "Validation");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_valid_bearer_token() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app.client.get(app.url("/api/user/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let problem: Value = res.json().await?;
    assert_eq!(problem["detail"], "Missing Authorization header");

    let res = app.get_as("not.a.token", "/api/user/me").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn one_mailbox_is_one_account_regardless_of_case() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let bob = app.sign_up("bob@example.com", "bobby").await?;

    let res = app.post("/api/auth/login", json!({ "email": "Bob@Example.com", "password": "pw" })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = res.json().await?;
    assert_eq!(login["user"]["userId"], bob.user_id.as_str());

    let res = app.post("/api/auth/register", json!({ "email": "BOB@example.com" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_with_malformed_email_is_unauthorized() -> Result<()> {
    let app = common::TestApp::spawn().await?;

    let res = app.post("/api/auth/login", json!({ "email": "not-an-email", "password": "pw" })).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
