#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{router, AppState, Paging};
use auth_adapters::GatewayIdentityResolver;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domains::{Repositories, UserId};
use serde_json::Value;
use services::{ContentLimits, DenylistPolicy, Services};
use storage_adapters::MemoryStore;
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_paging(Paging::default())
    }

    pub fn with_paging(paging: Paging) -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(
            Repositories::from_store(store.clone()),
            Arc::new(DenylistPolicy::default()),
            ContentLimits::default(),
        );
        let state = AppState::new(services, Arc::new(GatewayIdentityResolver::new()), paging);
        Self {
            router: router(state),
            store,
        }
    }

    pub fn register(&self, user: &str, display_name: &str) {
        self.store.register_user(UserId::new(user), display_name);
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            req = req.header(header::AUTHORIZATION, format!("Bearer {user}"));
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(user), None).await
    }

    /// Creates a post and returns its id.
    pub async fn create_post(&self, user: &str, content: &str, category: &str) -> String {
        let (status, body) = self
            .post(
                "/posts",
                user,
                serde_json::json!({ "content": content, "category": category }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["post"]["id"].as_str().unwrap().to_string()
    }

    /// Creates a comment (or reply) and returns its id.
    pub async fn create_comment(
        &self,
        user: &str,
        post_id: &str,
        content: &str,
        parent: Option<&str>,
    ) -> String {
        let (status, body) = self
            .post(
                &format!("/comments/post/{post_id}"),
                user,
                serde_json::json!({ "content": content, "parentCommentId": parent }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["comment"]["id"].as_str().unwrap().to_string()
    }

    pub async fn post_view(&self, post_id: &str, user: Option<&str>) -> Value {
        let (status, body) = self.get(&format!("/posts/{post_id}"), user).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["post"].clone()
    }
}
