mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{allergen_body, TestApp};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["result"]["database"], json!("ok"));
    Ok(())
}

#[tokio::test]
async fn root_lists_service_info() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get("/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["name"], json!("allergy-profile-api"));
    Ok(())
}

#[tokio::test]
async fn missing_token_never_reaches_storage() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.post("/api/allergens", None, allergen_body("Peanut", "Đậu phộng", "food")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "success": false, "message": "Missing Authorization header" }));

    let (status, _) = app.delete("/api/allergens/0123456789abcdef01234567", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn non_admin_is_forbidden_before_storage() -> Result<()> {
    let app = TestApp::new();
    let user = app.user_token();

    let (status, body) = app
        .post("/api/allergens", Some(&user), allergen_body("Peanut", "Đậu phộng", "food"))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));

    let (status, _) = app.get("/api/users", Some(&user)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.store.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn auth_runs_before_body_parsing() -> Result<()> {
    let app = TestApp::new();
    // malformed body, but the missing token wins
    let (status, _) = app.post("/api/symptoms", None, json!({ "nonsense": true })).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn foreign_tokens_are_rejected() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get("/api/pap", Some("not.a.jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap_or_default().starts_with("Invalid JWT token"));
    Ok(())
}

#[tokio::test]
async fn catalog_reads_are_public() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.get("/api/allergens", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!([]));
    Ok(())
}

#[tokio::test]
async fn user_listing_hides_password_hashes() -> Result<()> {
    let app = TestApp::new();
    app.register("hoa@example.com").await?;

    let admin = app.admin_token();
    let (status, body) = app.get("/api/users", Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    let users = body["result"].as_array().cloned().unwrap_or_default();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], json!("hoa@example.com"));
    assert!(users[0].get("passwordHash").is_none());
    Ok(())
}
