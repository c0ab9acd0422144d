#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use api::{AppState, resources::memory_store, router};
use async_trait::async_trait;
use auth::{AuthService, MailError, Mailer, Message, Role, TokenService};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use storage::{CollectionStore, MemoryStore};
use tower::ServiceExt;

#[derive(Default)]
pub struct Outbox(pub Mutex<Vec<Message>>);

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, message: &Message) -> Result<(), MailError> {
        self.0.lock().unwrap().push(message.clone());
        Ok(())
    }
}

impl Outbox {
    /// Reset token from the most recent message's link.
    pub fn last_reset_token(&self) -> String {
        let messages = self.0.lock().unwrap();
        let body = &messages.last().expect("no message sent").body;
        body.rsplit('/').next().unwrap().trim().to_string()
    }
}

pub struct Bounce;

#[async_trait]
impl Mailer for Bounce {
    async fn send(&self, _message: &Message) -> Result<(), MailError> {
        Err(MailError("mail server unreachable".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<Outbox>,
}

pub fn app() -> TestApp {
    let outbox = Arc::new(Outbox::default());
    build(outbox.clone(), outbox)
}

pub fn app_with_mailer(mailer: Arc<dyn Mailer>) -> TestApp {
    build(mailer, Arc::new(Outbox::default()))
}

fn build(mailer: Arc<dyn Mailer>, outbox: Arc<Outbox>) -> TestApp {
    let store = Arc::new(memory_store());
    let auth = AuthService::new(store.clone(), TokenService::new("integration_secret", 3600), mailer);
    let state = Arc::new(AppState::new(store.clone(), auth));

    TestApp {
        router: router(state.clone()),
        state,
        store,
        outbox,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, token, None)).await
    }

    /// Register an account and return its session token.
    pub async fn register(&self, email: &str, role: Role) -> String {
        let body = json!({ "name": "Test User", "email": email, "password": "123456", "role": role });
        let (status, body) = self.post("/api/v1/auth/register", None, body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.state.auth.ensure_admin("admin@devcamper.io", "adminpass").await.unwrap();
        let session = self.state.auth.login("admin@devcamper.io", "adminpass").await.unwrap();
        session.token
    }

    pub async fn insert(&self, collection: &str, document: Value) -> Value {
        let stored = self
            .store
            .insert(collection, document.as_object().cloned().unwrap())
            .await
            .unwrap();
        Value::Object(stored)
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
