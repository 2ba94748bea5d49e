use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

use crate::{
    config::Config,
    generator::MessageGenerator,
    models::MessageTone,
    AppState,
};

/// Answers "<Tone> note for <recipient>" after an optional delay.
pub struct StubGenerator {
    pub delay: Duration,
}

#[async_trait]
impl MessageGenerator for StubGenerator {
    async fn generate(&self, recipient: &str, tone: MessageTone) -> String {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        format!("{} note for {}", tone, recipient)
    }
}

pub fn test_config(generations_per_minute: u32) -> Config {
    let mut config = Config::from_lookup(|key| match key {
        "PUBLIC_ORIGIN" => Some("https://wish.test".to_string()),
        _ => None,
    });
    config.generations_per_minute = generations_per_minute;
    config
}

pub fn test_app() -> Router {
    test_app_with(Duration::ZERO, 1_000)
}

pub fn test_app_with(generation_delay: Duration, generations_per_minute: u32) -> Router {
    let config = test_config(generations_per_minute);
    let generator = Arc::new(StubGenerator {
        delay: generation_delay,
    });
    crate::app(AppState::new(config, generator))
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, String, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, bytes.to_vec())
}

/// JSON request; the body comes back as `Value::Null` when it isn't JSON.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let (status, _, bytes) = call(app, builder.body(body).unwrap()).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn get_text(app: &Router, uri: &str) -> (StatusCode, String, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, content_type, bytes) = call(app, request).await;
    (status, content_type, String::from_utf8(bytes).unwrap())
}
