mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn registration_token_opens_own_profile() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "Quang@Example.com", "name": "Quang", "password": "correct horse" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], json!("User registered"));
    let token = body["result"]["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    let (status, profile) = app.get("/api/pap", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["result"]["userId"], body["result"]["id"]);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> Result<()> {
    let app = TestApp::new();
    app.register("trang@example.com").await?;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "TRANG@example.com", "name": "Other", "password": "long enough" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    Ok(())
}

#[tokio::test]
async fn admins_cannot_self_register() -> Result<()> {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "root@example.com", "name": "Root", "password": "long enough", "role": "admin" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn weak_registrations_are_rejected() -> Result<()> {
    let app = TestApp::new();
    for body in [
        json!({ "email": "not-an-email", "name": "X", "password": "long enough" }),
        json!({ "email": "x@example.com", "name": "X", "password": "short" }),
        json!({ "email": "x@example.com", "name": "", "password": "long enough" }),
    ] {
        let (status, response) = app.post("/api/auth/register", None, body.clone()).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", body, response);
    }
    Ok(())
}

#[tokio::test]
async fn login_checks_the_password() -> Result<()> {
    let app = TestApp::new();
    let (user_id, _, _) = app.register("vy@example.com").await?;

    let (status, ok) = app
        .post("/api/auth/login", None, json!({ "email": "VY@example.com", "password": "long enough" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ok["result"]["id"], json!(user_id));
    assert_eq!(ok["result"]["role"], json!("user"));

    let token = ok["result"]["token"].as_str().unwrap_or_default().to_string();
    let (status, _) = app.get("/api/pap", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, wrong) = app
        .post("/api/auth/login", None, json!({ "email": "vy@example.com", "password": "wrong password" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], json!("Invalid email or password"));

    let (status, unknown) = app
        .post("/api/auth/login", None, json!({ "email": "nobody@example.com", "password": "long enough" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
    Ok(())
}

#[tokio::test]
async fn admin_created_users_get_a_profile_and_deletion_removes_it() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin_token();

    let (status, created) = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "email": "staff@example.com", "name": "Staff", "password": "long enough", "role": "admin" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = created["result"].as_str().unwrap_or_default().to_string();

    let (status, user) = app.get(&format!("/api/users/{}", user_id), Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["result"]["role"], json!("admin"));
    assert!(user["result"].get("passwordHash").is_none());

    let (status, _) = app.get(&format!("/api/pap/{}", user_id), Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&format!("/api/users/{}", user_id), Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/pap/{}", user_id), Some(&admin)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/users/{}", user_id), Some(&admin)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn password_updates_rehash() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin_token();
    let (user_id, _, _) = app.register("xuan@example.com").await?;

    let (status, _) = app
        .put(&format!("/api/users/{}", user_id), Some(&admin), json!({ "password": "a new passphrase" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/auth/login", None, json!({ "email": "xuan@example.com", "password": "a new passphrase" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn email_updates_cannot_take_another_account() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin_token();
    app.register("an@example.com").await?;
    let (binh, _, _) = app.register("binh@example.com").await?;

    let (status, body) = app
        .put(&format!("/api/users/{}", binh), Some(&admin), json!({ "email": "AN@example.com" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    assert_eq!(body["success"], json!(false));

    let (status, users) = app.get("/api/users?email=an@example.com", Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["result"].as_array().map(Vec::len), Some(1));

    let (status, same) = app
        .put(&format!("/api/users/{}", binh), Some(&admin), json!({ "email": "Binh@example.com" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(same["message"], json!("No changes applied"));
    assert_eq!(same["result"], json!({ "matched": 1, "modified": 0 }));

    let (status, _) = app
        .put("/api/users/0123456789abcdef01234567", Some(&admin), json!({ "name": "Nobody" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn registration_without_a_secret_writes_nothing() -> Result<()> {
    let app = TestApp::with_config(|config| config.security.jwt_secret.clear());
    let body = json!({ "email": "phuong@example.com", "name": "Phuong", "password": "long enough" });

    let (status, first) = app.post("/api/auth/register", None, body.clone()).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", first);
    assert_eq!(app.store.calls(), 0);

    // a retry hits the same wall instead of a leftover account
    let (status, _) = app.post("/api/auth/register", None, body).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.store.calls(), 0);
    Ok(())
}
