mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{allergen_body, TestApp};

fn ids(body: &Value) -> Vec<String> {
    body["result"]
        .as_array()
        .map(|docs| docs.iter().filter_map(|d| d["id"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn paging_visits_every_symptom_once_in_order() -> Result<()> {
    let app = TestApp::new();
    let mut created = Vec::new();
    for n in 0..5 {
        created.push(app.create_symptom(&format!("Symptom {}", n), 1).await?);
    }

    let mut seen = Vec::new();
    for offset in [0, 2, 4] {
        let (status, page) = app.get(&format!("/api/symptoms?limit=2&offset={}", offset), None).await?;
        assert_eq!(status, StatusCode::OK);
        seen.extend(ids(&page));
    }
    assert_eq!(seen, created);

    let (_, past_end) = app.get("/api/symptoms?offset=10", None).await?;
    assert_eq!(past_end["result"], json!([]));
    Ok(())
}

#[tokio::test]
async fn enum_filter_matches_exactly() -> Result<()> {
    let app = TestApp::new();
    app.create("/api/allergens", allergen_body("Peanut", "Đậu phộng", "food")).await?;
    let penicillin = app.create("/api/allergens", allergen_body("Penicillin", "Penicillin", "drug")).await?;

    let (status, drugs) = app.get("/api/allergens?type=drug", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&drugs), vec![penicillin]);
    Ok(())
}

#[tokio::test]
async fn localized_filter_is_a_substring_match() -> Result<()> {
    let app = TestApp::new();
    let peanut = app.create_allergen("Peanut", "Đậu phộng").await?;
    app.create_allergen("Milk", "Sữa").await?;

    let (_, english) = app.get("/api/allergens?name=nut&lang=en", None).await?;
    assert_eq!(ids(&english), vec![peanut.clone()]);

    let (_, vietnamese) = app.get("/api/allergens?name=ph&lang=vi", None).await?;
    assert_eq!(ids(&vietnamese), vec![peanut]);
    Ok(())
}

#[tokio::test]
async fn id_filter_selects_one() -> Result<()> {
    let app = TestApp::new();
    app.create_allergen("Peanut", "Đậu phộng").await?;
    let milk = app.create_allergen("Milk", "Sữa").await?;

    let (_, found) = app.get(&format!("/api/allergens?id={}", milk), None).await?;
    assert_eq!(ids(&found), vec![milk]);
    Ok(())
}

#[tokio::test]
async fn bad_filters_are_client_errors() -> Result<()> {
    let app = TestApp::new();

    for uri in [
        "/api/allergens?colour=red",
        "/api/allergens?type=mineral",
        "/api/allergens?symptomsId=0123456789abcdef01234567",
        "/api/symptoms?severity=high",
        "/api/symptoms?limit=-1",
        "/api/symptoms?offset=two",
        "/api/symptoms?id=xyz",
    ] {
        let (status, body) = app.get(uri, None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", uri, body);
        assert_eq!(body["success"], json!(false));
    }
    Ok(())
}

#[tokio::test]
async fn users_cannot_be_filtered_by_password_hash() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin_token();
    let (status, _) = app.get("/api/users?passwordHash=abc", Some(&admin)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
