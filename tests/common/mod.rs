#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::Extension;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;
use tokio::net::TcpListener;

use visitlog::auth::StaticTokenVerifier;
use visitlog::config::Config;
use visitlog::connection::ConnectionInfo;
use visitlog::service::VisitService;
use visitlog::store::{DocumentVisitStore, TableVisitStore, VisitStore};
use visitlog::{AppState, build_app};

pub const TOKEN: &str = "test-token";
pub const SUBJECT: &str = "tester";

pub const LOCAL: &str = "127.0.0.1:8080";
pub const REMOTE: &str = "10.1.2.3:54321";

pub struct TestApp {
    pub router: Router,
    pub store: VisitStore,
    _dir: Option<TempDir>,
}

/// Config with the test token accepted and everything else at its default.
pub fn test_config() -> Config {
    let mut config = Config::with_table_store("sqlite::memory:");
    config.identity.api_tokens = HashMap::from([(TOKEN.to_string(), SUBJECT.to_string())]);
    config
}

pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory SQLite pool")
}

fn state(store: VisitStore, config: Config) -> AppState {
    let verifier = Arc::new(StaticTokenVerifier::new(config.identity.api_tokens.clone()));
    AppState::new(VisitService::new(store), config, verifier)
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Row store on an in-memory database, with `tweak` applied to the config.
    pub async fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let store = TableVisitStore::open(memory_pool().await, "visits")
            .await
            .expect("Failed to create visit table");

        let mut config = test_config();
        tweak(&mut config);
        Self::from_store(VisitStore::Table(store), config, None)
    }

    /// Document store in a fresh temporary directory.
    pub async fn with_document_store() -> Self {
        let dir = TempDir::new().unwrap();
        let store = DocumentVisitStore::open(dir.path(), "visits")
            .await
            .expect("Failed to create visit collection");

        Self::from_store(VisitStore::Document(store), test_config(), Some(dir))
    }

    fn from_store(store: VisitStore, config: Config, dir: Option<TempDir>) -> Self {
        let connection = ConnectionInfo {
            local: Some(LOCAL.parse().unwrap()),
            remote: REMOTE.parse().unwrap(),
        };
        let router = build_app(state(store.clone(), config)).layer(Extension(ConnectInfo(connection)));

        Self {
            router,
            store,
            _dir: dir,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        match &self.store {
            VisitStore::Table(store) => store.pool(),
            VisitStore::Document(_) => panic!("document store has no pool"),
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.request(builder.body(body).unwrap()).await
    }

    /// Send a GET request with an optional bearer token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send("GET", uri, None, token).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send("POST", uri, Some(body), token).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value, token: Option<&str>) -> Response {
        self.send("PUT", uri, Some(body), token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.send("DELETE", uri, None, token).await
    }

    /// Create a visit through the API and return its JSON body.
    pub async fn create_visit(&self, user: &str, information: &str) -> Value {
        let body = serde_json::json!({ "user": user, "information": information });
        let resp = self.post_json("/visit", &body, Some(TOKEN)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).expect("Response body should be JSON")
}

/// Serve a row-store app on an ephemeral port and return its base URL.
pub async fn spawn_server(tweak: impl FnOnce(&mut Config)) -> String {
    let store = TableVisitStore::open(memory_pool().await, "visits")
        .await
        .expect("Failed to create visit table");
    let mut config = test_config();
    tweak(&mut config);
    let app = build_app(state(VisitStore::Table(store), config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(visitlog::serve(listener, app));

    format!("http://{addr}/")
}
