//! Shared harness for book-server integration tests: a temp database, a
//! scripted OAuth provider, and a cookie-carrying browser.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use url::Url;

use book_server::auth::{OAuthProvider, ProviderProfile};
use book_server::content::ContentStore;
use book_server::{db, AppState, SqliteSessionStore};

/// Provider whose `exchange` answers from a fixed code → profile table.
pub struct FakeProvider {
    profiles: HashMap<String, ProviderProfile>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn with_user(mut self, code: &str, uid: &str, nickname: &str) -> Self {
        self.profiles.insert(code.to_string(), profile(uid, nickname));
        self
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn authorize_url(&self, state: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse("https://github.test/login/oauth/authorize")?;
        url.query_pairs_mut()
            .append_pair("client_id", "test-client")
            .append_pair("state", state);
        Ok(url)
    }

    async fn exchange(&self, code: &str) -> anyhow::Result<ProviderProfile> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("bad_verification_code"))
    }
}

pub fn profile(uid: &str, nickname: &str) -> ProviderProfile {
    ProviderProfile {
        provider: "github".to_string(),
        uid: uid.to_string(),
        nickname: Some(nickname.to_string()),
        email: Some(format!("{uid}@example.com")),
        avatar_url: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub content_dir: std::path::PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn browser(&self) -> Browser {
        Browser {
            app: self.router.clone(),
            cookie: None,
        }
    }
}

/// App with two known GitHub users: code `alice-code` and code `bob-code`.
pub async fn setup_test_app() -> TestApp {
    let provider = FakeProvider::new()
        .with_user("alice-code", "1001", "Alice")
        .with_user("bob-code", "1002", "Bob");
    setup_test_app_with(provider).await
}

pub async fn setup_test_app_with(provider: FakeProvider) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = temp_dir.path().join("book_test.db");
    let db = db::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test database");

    let content_dir = temp_dir.path().join("content");
    std::fs::create_dir_all(&content_dir).expect("failed to create content dir");

    let store = SqliteSessionStore::new(db.clone());

    let state = Arc::new(AppState {
        db: db.clone(),
        oauth: Arc::new(provider),
        content: ContentStore::new(content_dir.clone()),
    });
    let router = book_server::router(state, book_server::session_layer(store, false, 24));

    TestApp {
        router,
        db,
        content_dir,
        _temp_dir: temp_dir,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("invalid json")
    }
}

/// Drives the router like a browser tab: remembers the session cookie.
pub struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    pub async fn send(&mut self, mut req: Request<Body>) -> Reply {
        if let Some(cookie) = &self.cookie {
            req.headers_mut()
                .insert(header::COOKIE, cookie.parse().expect("bad cookie"));
        }
        let response = self.app.clone().oneshot(req).await.expect("request failed");

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let raw = set_cookie.to_str().expect("set-cookie not ascii");
            let pair = raw.split(';').next().unwrap_or_default().trim();
            if raw.contains("Max-Age=0") || pair.ends_with('=') {
                self.cookie = None;
            } else {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        Reply {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> Reply {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn get_json(&mut self, uri: &str) -> Reply {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    /// Form post. `csrf` goes in the `X-CSRF-Token` header when given.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)], csrf: Option<&str>) -> Reply {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = csrf {
            builder = builder.header(shared_types::CSRF_HEADER, token);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Load the home page and read the anti-forgery token from its meta tag.
    pub async fn csrf_token(&mut self) -> String {
        let reply = self.get("/").await;
        assert_eq!(reply.status, StatusCode::OK);
        meta_csrf_token(&reply.body).expect("page has no csrf meta tag")
    }

    /// Walk the OAuth redirect dance with the given provider code.
    /// Returns the callback reply.
    pub async fn sign_in(&mut self, code: &str) -> Reply {
        let start = self.get("/auth/github").await;
        assert_eq!(start.status, StatusCode::SEE_OTHER);
        let authorize = Url::parse(start.location().expect("no redirect")).expect("bad url");
        let state = authorize
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("authorize url without state");

        self.get(&format!("/auth/github/callback?code={code}&state={state}"))
            .await
    }

    pub async fn upload(&mut self, chapter: i64, section: i64, payload: &str) -> Reply {
        let token = self.csrf_token().await;
        let (chapter, section) = (chapter.to_string(), section.to_string());
        self.post_form(
            "/annotate",
            &[
                ("chapter", chapter.as_str()),
                ("section", section.as_str()),
                ("annotation", payload),
            ],
            Some(&token),
        )
        .await
    }

    pub async fn fetch(&mut self, chapter: i64, section: i64) -> Value {
        let reply = self
            .get_json(&format!("/fetch_annotations?chapter={chapter}&section={section}"))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.json()
    }
}

pub fn meta_csrf_token(html: &str) -> Option<String> {
    let marker = r#"<meta name="csrf-token" content=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}
