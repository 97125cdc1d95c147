#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;

use vendor_tracker::AppState;
use vendor_tracker::config::Config;
use vendor_tracker::router;
use vendor_tracker::store::{MemoryLocationStore, MemoryProfileStore, VendorProfile};
use vendor_tracker::utils::{Claims, Role};

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub locations: Arc<MemoryLocationStore>,
    pub profiles: Arc<MemoryProfileStore>,
}

pub fn test_config() -> Config {
    Config::new(String::new(), SECRET.to_string())
}

/// Router over in-process stores, mirroring the production middleware
/// stack except for the redis-backed rate limiter.
pub fn build_test_app() -> TestApp {
    let locations = Arc::new(MemoryLocationStore::new());
    let profiles = Arc::new(MemoryProfileStore::new());
    let state = AppState::new(test_config(), locations.clone(), profiles.clone());
    TestApp {
        router: router::build(state),
        locations,
        profiles,
    }
}

pub fn profile(vendor_id: &str, business_name: &str) -> VendorProfile {
    VendorProfile {
        vendor_id: vendor_id.to_string(),
        business_name: business_name.to_string(),
        owner_name: "Owner".to_string(),
        phone: "555-0100".to_string(),
        description: format!("{business_name} on wheels"),
        offerings: vec!["coffee".to_string(), "bagels".to_string()],
    }
}

pub fn token(user_id: &str, vendor_id: Option<&str>, role: Role) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        vendor_id: vendor_id.map(str::to_string),
        role,
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn vendor_token(vendor_id: &str) -> String {
    token(&format!("owner-{vendor_id}"), Some(vendor_id), Role::Vendor)
}

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn put_json(app: &TestApp, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
