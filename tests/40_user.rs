mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn lookup_by_id_and_email() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let me = app.sign_up("someone@example.com", "someone").await?;

    let by_id: Value = app.get_as(&me.jwt, &format!("/api/user/id/{}", me.user_id)).await?.json().await?;
    assert_eq!(by_id["email"], "someone@example.com");

    let by_email: Value = app.get_as(&me.jwt, "/api/user/email/someone@example.com").await?.json().await?;
    assert_eq!(by_email["id"], me.user_id.as_str());
    Ok(())
}

#[tokio::test]
async fn unknown_users_are_not_found() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let me = app.sign_up("someone@example.com", "someone").await?;

    let res = app.get_as(&me.jwt, &format!("/api/user/id/{}", uuid::Uuid::new_v4())).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.get_as(&me.jwt, "/api/user/email/ghost@example.com").await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let problem: Value = res.json().await?;
    assert_eq!(problem["detail"], "User with email ghost@example.com not found");
    Ok(())
}

#[tokio::test]
async fn create_user_validates_input() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let me = app.sign_up("someone@example.com", "someone").await?;

    let res = app
        .post_as(&me.jwt, "/api/user", json!({ "username": "newcomer", "email": "new@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .post_as(&me.jwt, "/api/user", json!({ "username": "abc", "email": "short@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .post_as(&me.jwt, "/api/user", json!({ "username": "duplicate", "email": "someone@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn users_may_only_rename_themselves() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let alice = app.sign_up("alice@example.com", "alice").await?;
    let bob = app.sign_up("bob@example.com", "bobby").await?;

    let res = app
        .put_as(&bob.jwt, &format!("/api/user/{}", alice.user_id), json!({ "username": "mallory" }))
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .put_as(&alice.jwt, &format!("/api/user/{}", alice.user_id), json!({ "username": "alice-renamed" }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["username"], "alice-renamed");

    let res = app
        .put_as(&alice.jwt, &format!("/api/user/{}", alice.user_id), json!({ "username": "al" }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
