#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use allergy_profile_api::auth::issue_token;
use allergy_profile_api::config::AppConfig;
use allergy_profile_api::database::{DocumentId, MemoryDocumentStore};
use allergy_profile_api::handlers;
use allergy_profile_api::models::{self, Role};
use allergy_profile_api::AppState;

pub const SECRET: &str = "integration-test-secret";

/// The full router over a fresh in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryDocumentStore>,
    pub config: AppConfig,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Like [`TestApp::new`], with `adjust` applied to the config last.
    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::development();
        config.security.jwt_secret = SECRET.to_string();
        config.security.password_hash_cost = 4;
        config.api.enable_request_logging = false;
        adjust(&mut config);

        let store = Arc::new(MemoryDocumentStore::new().with_unique_text_fields(models::UNIQUE_TEXT_FIELDS));
        let router = handlers::app(AppState::new(store.clone(), config.clone()));
        Self { store, config, router }
    }

    pub fn token_for(&self, user_id: DocumentId, role: Role) -> String {
        issue_token(&self.config.security, user_id, role).expect("token")
    }

    pub fn admin_token(&self) -> String {
        self.token_for(DocumentId::generate(), Role::Admin)
    }

    pub fn user_token(&self) -> String {
        self.token_for(DocumentId::generate(), Role::User)
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response is not JSON")?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Creates a catalog document as admin and returns its id.
    pub async fn create(&self, path: &str, body: Value) -> Result<String> {
        let admin = self.admin_token();
        let (status, value) = self.post(path, Some(&admin), body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create {} failed: {} {}", path, status, value);
        Ok(value["result"].as_str().context("id in result")?.to_string())
    }

    pub async fn create_symptom(&self, en: &str, severity: u8) -> Result<String> {
        self.create("/api/symptoms", symptom_body(en, severity)).await
    }

    pub async fn create_allergen(&self, en: &str, vi: &str) -> Result<String> {
        self.create("/api/allergens", allergen_body(en, vi, "food")).await
    }

    /// Registers a user and returns `(user id, public id, token)`.
    pub async fn register(&self, email: &str) -> Result<(String, String, String)> {
        let (status, value) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "name": "Test User", "password": "long enough" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, value);
        let result = &value["result"];
        Ok((
            result["id"].as_str().context("id")?.to_string(),
            result["publicId"].as_str().context("publicId")?.to_string(),
            result["token"].as_str().context("token")?.to_string(),
        ))
    }
}

pub fn allergen_body(en: &str, vi: &str, kind: &str) -> Value {
    json!({
        "type": kind,
        "name": { "en": en, "vi": vi },
        "description": { "en": format!("About {}.", en), "vi": format!("Về {}.", vi) },
        "symptomsId": [],
        "crossSensitivityId": [],
        "isWholeAllergen": true
    })
}

pub fn symptom_body(en: &str, severity: u8) -> Value {
    json!({
        "name": { "en": en, "vi": format!("{} (vi)", en) },
        "description": { "en": "Observed reaction.", "vi": "Phản ứng quan sát được." },
        "severity": severity,
        "organ": "skin"
    })
}
