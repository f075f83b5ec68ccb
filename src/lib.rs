pub mod auth;
pub mod client;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::{StaticTokenVerifier, TokenVerifier};
use crate::config::Config;
use crate::connection::ConnectionInfo;
use crate::service::VisitService;
use crate::store::{StoreError, VisitStore};

#[derive(Clone)]
pub struct AppState {
    pub service: VisitService,
    pub config: Arc<Config>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(service: VisitService, config: Config, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            service,
            config: Arc::new(config),
            verifier,
        }
    }

    /// Connect the configured storage backend and the built-in token verifier.
    pub async fn from_config(config: Config) -> Result<Self, StoreError> {
        let store = VisitStore::connect(&config.storage).await?;
        let verifier = Arc::new(StaticTokenVerifier::new(config.identity.api_tokens.clone()));
        Ok(Self::new(VisitService::new(store), config, verifier))
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origin) = &config.cors_allowed_origin else {
        return CorsLayer::very_permissive();
    };

    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static("access-control-allow-origin"),
            ]),
        Err(e) => {
            tracing::warn!("Invalid CORS_ALLOWED_ORIGIN {origin:?}: {e}, allowing any origin");
            CorsLayer::very_permissive()
        }
    }
}

/// Build the full Axum application router.
///
/// The storage backend in `state` must already be connected. Endpoint capture
/// expects the router to be served with [`serve`] (or a `MockConnectInfo`
/// layer in tests); without it, endpoints are recorded empty.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(routes::system::router())
        .merge(routes::visits::router())
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Serve `app` on `listener`, attaching [`ConnectionInfo`] to every request.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<ConnectionInfo>(),
    )
    .await
}
