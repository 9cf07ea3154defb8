//! Drives the router in-process with `tower::ServiceExt::oneshot`, backed by
//! `MemoryStore` and an in-memory users directory. Login tests talk to a fake
//! provider served by axum on an ephemeral port.

use std::collections::HashMap;
use std::sync::Arc;

use api::auth::{GitHubOAuth, SessionTokenCodec};
use api::users::{RegisteredUser, RegistryError, UserRegistry};
use api::Config;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use server::{router, AppState};
use store::MemoryStore;
use tower::ServiceExt;

/// Answers lookups with `name-of-{id}`; `broken` makes every call fail.
struct Directory {
    broken: bool,
}

fn registry_failure() -> RegistryError {
    RegistryError::Decode(serde_json::from_str::<Value>("{").unwrap_err())
}

#[async_trait]
impl UserRegistry for Directory {
    async fn provision(&self, _user_id: &str, _username: &str) -> Result<(), RegistryError> {
        if self.broken {
            return Err(registry_failure());
        }
        Ok(())
    }

    async fn lookup(&self, user_id: &str) -> Result<RegisteredUser, RegistryError> {
        if self.broken {
            return Err(registry_failure());
        }
        Ok(RegisteredUser {
            id: user_id.to_string(),
            username: format!("name-of-{}", user_id),
            created_at: None,
        })
    }
}

async fn access_token(Form(params): Form<HashMap<String, String>>) -> Json<Value> {
    if params.get("code").map(String::as_str) == Some("good-code") {
        Json(json!({ "access_token": "gho_test", "token_type": "bearer", "scope": "" }))
    } else {
        Json(json!({ "error": "bad_verification_code" }))
    }
}

async fn profile(headers: HeaderMap) -> Response {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer gho_test") => Json(json!({ "id": 4242, "login": "octocat" })).into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Serves the token and profile endpoints on an ephemeral port.
async fn spawn_provider() -> String {
    let app = Router::new()
        .route("/login/oauth/access_token", post(access_token))
        .route("/user", get(profile));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

struct TestApp {
    app: Router,
    codec: Arc<SessionTokenCodec>,
}

impl TestApp {
    fn new() -> Self {
        Self::build(Directory { broken: false }, None)
    }

    fn with_directory(directory: Directory) -> Self {
        Self::build(directory, None)
    }

    /// Provider endpoints all point at `provider`.
    fn with_provider(provider: &str) -> Self {
        Self::build(Directory { broken: false }, Some(provider))
    }

    fn build(directory: Directory, provider: Option<&str>) -> Self {
        let mut vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_URL", "postgres://unused".to_string()),
            ("GITHUB_CLIENT_ID", "client-id".to_string()),
            ("GITHUB_CLIENT_SECRET", "client-secret".to_string()),
            ("USERS_SERVICE", "http://users.invalid".to_string()),
            ("SESSION_TOKEN_SECRET", "test-secret".to_string()),
            ("HTTP_TIMEOUT_SECS", "5".to_string()),
        ]);
        if let Some(provider) = provider {
            vars.insert("LOGIN_URI", format!("{}/login/oauth/authorize", provider));
            vars.insert(
                "ACCESS_TOKEN_URI",
                format!("{}/login/oauth/access_token", provider),
            );
            vars.insert("PROFILE_URI", provider.to_string());
        }
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let store = Arc::new(MemoryStore::new());
        let users: Arc<dyn UserRegistry> = Arc::new(directory);
        let codec = Arc::new(SessionTokenCodec::new(&config.session));
        let oauth = GitHubOAuth::new(
            config.oauth.clone(),
            config.http_client().unwrap(),
            store.clone(),
            users.clone(),
            codec.clone(),
        );

        let app = router(AppState {
            notes: store,
            users,
            codec: codec.clone(),
            oauth: Arc::new(oauth),
        });
        Self { app, codec }
    }

    fn token(&self, user_id: &str) -> String {
        self.codec.issue(user_id, &format!("{}-login", user_id)).unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Start a login and return the `state` the provider would echo back.
    async fn login_state(&self) -> String {
        let response = self.get("/login/github").await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        let (_, rest) = location.split_once("state=").unwrap();
        rest.split('&').next().unwrap().to_string()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Create a note and return its id.
    async fn create(&self, token: &str, title: &str) -> String {
        let body = json!({ "title": title, "body": "body" }).to_string();
        let (status, value) = self
            .send(Method::POST, "/notes", Some(token), Some(&body))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        // "note '<id>' created successfully"
        let msg = value["msg"].as_str().unwrap();
        msg.split('\'').nth(1).unwrap().to_string()
    }
}

#[tokio::test]
async fn test_notes_require_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = app
        .send(Method::GET, "/notes", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = app
        .codec
        .issue_at("user_1", "alice", Utc::now() - app.codec.ttl() - Duration::hours(1))
        .unwrap();
    let (status, _) = app.send(Method::GET, "/notes", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign_secret = {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://unused"),
            ("GITHUB_CLIENT_ID", "client-id"),
            ("GITHUB_CLIENT_SECRET", "client-secret"),
            ("USERS_SERVICE", "http://users.invalid"),
            ("SESSION_TOKEN_SECRET", "another-secret"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        SessionTokenCodec::new(&config.session)
            .issue("user_1", "alice")
            .unwrap()
    };
    let (status, _) = app
        .send(Method::GET, "/notes", Some(&foreign_secret), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_note_lifecycle() {
    let app = TestApp::new();
    let token = app.token("user_1");

    let id = app.create(&token, "Note 1").await;

    let (status, note) = app
        .send(Method::GET, &format!("/notes/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["title"], "Note 1");
    assert_eq!(note["user_id"], "user_1");
    assert_eq!(note["username"], "name-of-user_1");

    let update = json!({ "title": "Note 1 (edited)", "body": "new body" }).to_string();
    let (status, body) = app
        .send(Method::PUT, &format!("/notes/{}", id), Some(&token), Some(&update))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], format!("note '{}' is updated successfully", id));

    let (_, note) = app
        .send(Method::GET, &format!("/notes/{}", id), Some(&token), None)
        .await;
    assert_eq!(note["title"], "Note 1 (edited)");
    assert_eq!(note["body"], "new body");

    let (status, body) = app
        .send(Method::DELETE, &format!("/notes/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["msg"], format!("note '{}' deleted successfully", id));

    let (status, body) = app
        .send(Method::GET, &format!("/notes/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "note not found" }));
}

#[tokio::test]
async fn test_notes_are_scoped_to_their_owner() {
    let app = TestApp::new();
    let alice = app.token("user_1");
    let bob = app.token("user_2");

    let id = app.create(&alice, "Note 1").await;
    app.create(&bob, "bob's").await;

    let (status, _) = app
        .send(Method::GET, &format!("/notes/{}", id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let update = json!({ "title": "hijacked", "body": "" }).to_string();
    let (status, _) = app
        .send(Method::PUT, &format!("/notes/{}", id), Some(&bob), Some(&update))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::DELETE, &format!("/notes/{}", id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, note) = app
        .send(Method::GET, &format!("/notes/{}", id), Some(&alice), None)
        .await;
    assert_eq!(note["title"], "Note 1");

    let (status, list) = app.send(Method::GET, "/notes", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = TestApp::new();
    let token = app.token("user_1");

    let (status, body) = app
        .send(Method::POST, "/notes", Some(&token), Some("{not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid request body" }));

    let (status, _) = app
        .send(Method::POST, "/notes", Some(&token), Some(r#"{"title":"no body"}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = app.create(&token, "Note 1").await;
    let (status, _) = app
        .send(Method::PUT, &format!("/notes/{}", id), Some(&token), Some("[]"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let title_only = json!({ "title": "Updated Note 1" }).to_string();
    let (status, body) = app
        .send(Method::PUT, &format!("/notes/{}", id), Some(&token), Some(&title_only))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid request body" }));

    let (_, note) = app
        .send(Method::GET, &format!("/notes/{}", id), Some(&token), None)
        .await;
    assert_eq!(note["title"], "Note 1");

    let (_, list) = app.send(Method::GET, "/notes", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_owner_lookup_failure() {
    let app = TestApp::with_directory(Directory { broken: true });
    let token = app.token("user_1");
    let id = app.create(&token, "Note 1").await;

    let (status, body) = app
        .send(Method::GET, &format!("/notes/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "error while reading user" }));
}

#[tokio::test]
async fn test_login_redirects_to_provider() {
    let app = TestApp::new();

    let response = app.get("/login/github").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://github.com/login/oauth/authorize?"));
    assert!(location.contains("client_id=client-id"));
    assert!(location.contains("state="));
}

#[tokio::test]
async fn test_callback_rejects_bad_requests() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::GET, "/github/callback?code=abc&state=forged", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid oauth callback" }));

    let (status, _) = app
        .send(Method::GET, "/github/callback?state=whatever", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::GET, "/github/callback", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A query the extractor cannot read still gets the JSON error body
    let (status, body) = app
        .send(Method::GET, "/github/callback?code=a&code=b", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid oauth callback" }));
}

#[tokio::test]
async fn test_callback_answers_with_session_token() {
    let provider = spawn_provider().await;
    let app = TestApp::with_provider(&provider);
    let state = app.login_state().await;

    let response = app
        .get(&format!("/github/callback?code=good-code&state={}", state))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Welcome octocat!"));

    let token = text
        .lines()
        .find_map(|line| line.strip_prefix("Your session token: "))
        .unwrap();
    let identity = app.codec.authenticate(token).unwrap();
    assert_eq!(identity.user_id, "4242");
    assert_eq!(identity.username, "octocat");

    // The issued token opens the notes API
    let (status, _) = app.send(Method::GET, "/notes", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);

    // The state was spent by the first callback
    let (status, _) = app
        .send(
            Method::GET,
            &format!("/github/callback?code=good-code&state={}", state),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_reports_provider_failure() {
    let provider = spawn_provider().await;
    let app = TestApp::with_provider(&provider);
    let state = app.login_state().await;
    let (status, body) = app
        .send(
            Method::GET,
            &format!("/github/callback?code=wrong-code&state={}", state),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "error during authentication" }));

    let app = TestApp::with_provider(&dead_url().await);
    let state = app.login_state().await;
    let (status, body) = app
        .send(
            Method::GET,
            &format!("/github/callback?code=good-code&state={}", state),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "error during authentication" }));
}
