//! Helpers for driving the router in tests.

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::password::hash_password,
    state::AppState,
    users::repo::{NewUser, User},
};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn app(state: &AppState) -> Router {
    build_app(state.clone())
}

pub async fn send(state: &AppState, req: Request<Body>) -> TestResponse {
    let res = app(state).oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn seed_user(state: &AppState, email: &str, password: &str) -> User {
    state
        .users
        .insert(NewUser {
            fullname: "Test User".into(),
            email: email.into(),
            password_hash: hash_password(password).unwrap(),
            zipcode: "97203".into(),
            lat: None,
            lng: None,
        })
        .await
        .unwrap()
        .unwrap()
}

pub fn bearer_for(state: &AppState, user: &User) -> String {
    format!("Bearer {}", state.keys.sign(&user.email, user.id).unwrap())
}

pub fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or_default()
}
