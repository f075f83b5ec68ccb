use std::future::Future;

use reqwest::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue,
};
use reqwest::{Method, Response};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::VisitRequest;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("token is null")]
    MissingToken,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Supplies bearer tokens for the API, typically from an interactive or
/// silent sign-in flow.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// A token obtained out of band.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, ClientError> {
        Ok(self.0.clone())
    }
}

/// For deployments with authorization disabled; never yields a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenSource for NoToken {
    async fn access_token(&self) -> Result<String, ClientError> {
        Err(ClientError::MissingToken)
    }
}

/// Thin client over the visit REST API. Every call hands back the raw
/// response; callers interpret the status code.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    http: reqwest::Client,
    endpoint: Url,
    redirect_uri: Option<String>,
    authorization_disabled: bool,
    tokens: T,
}

impl<T: TokenSource> ApiClient<T> {
    pub fn new(endpoint: &str, tokens: T) -> Result<Self, ClientError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            redirect_uri: None,
            authorization_disabled: false,
            tokens,
        })
    }

    /// Origin announced on every request (the page's redirect URI).
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Use a preconfigured reqwest client (timeouts, proxies, TLS roots).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_authorization_disabled(mut self, disabled: bool) -> Self {
        self.authorization_disabled = disabled;
        self
    }

    pub async fn get_version(&self) -> Result<Response, ClientError> {
        self.call(Method::GET, &["version"], None).await
    }

    pub async fn get_time(&self) -> Result<Response, ClientError> {
        self.call(Method::GET, &["time"], None).await
    }

    pub async fn get_visits(&self) -> Result<Response, ClientError> {
        self.call(Method::GET, &["visit"], None).await
    }

    pub async fn get_visit(&self, id: &str) -> Result<Response, ClientError> {
        self.call(Method::GET, &["visit", id], None).await
    }

    pub async fn create_visit(&self, payload: &VisitRequest) -> Result<Response, ClientError> {
        self.call(Method::POST, &["visit"], Some(payload)).await
    }

    pub async fn update_visit(
        &self,
        id: &str,
        payload: &VisitRequest,
    ) -> Result<Response, ClientError> {
        self.call(Method::PUT, &["visit", id], Some(payload)).await
    }

    pub async fn delete_visit(&self, id: &str) -> Result<Response, ClientError> {
        self.call(Method::DELETE, &["visit", id], None).await
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        payload: Option<&VisitRequest>,
    ) -> Result<Response, ClientError> {
        let token = if self.authorization_disabled {
            None
        } else {
            let token = self.tokens.access_token().await?;
            if token.is_empty() {
                warn!("Calling API {} {}: token null", method, segments.join("/"));
                return Err(ClientError::MissingToken);
            }
            Some(token)
        };

        let url = self.url(segments)?;
        debug!("Calling API {} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(self.headers(token.as_deref()));
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Calling API {} {}: {}", method, segments.join("/"), e);
            e
        })?;
        debug!("Calling API {} {}: response {}", method, segments.join("/"), response.status());
        Ok(response)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => warn!("Bearer token is not a valid header value: {e}"),
            }
        }

        if let Some(uri) = self.redirect_uri.as_deref().filter(|uri| !uri.is_empty()) {
            let origin = uri.strip_suffix('/').unwrap_or(uri);
            match HeaderValue::from_str(origin) {
                Ok(value) => {
                    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
                }
                Err(e) => warn!("Redirect URI is not a valid header value: {e}"),
            }
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_token_origin_and_content_type() {
        let client = ApiClient::new("https://api.example.com/", StaticToken("tok".into()))
            .unwrap()
            .with_redirect_uri("https://app.example.com/");
        let headers = client.headers(Some("tok"));

        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let client = ApiClient::new("https://api.example.com/", NoToken).unwrap();
        let headers = client.headers(None);

        assert!(headers.get(AUTHORIZATION).is_none());
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn urls_are_built_from_encoded_segments() {
        let client = ApiClient::new("https://api.example.com/base/", NoToken).unwrap();
        assert_eq!(
            client.url(&["visit", "a b"]).unwrap().as_str(),
            "https://api.example.com/base/visit/a%20b"
        );

        let client = ApiClient::new("https://api.example.com/base", NoToken).unwrap();
        assert_eq!(
            client.url(&["visit"]).unwrap().as_str(),
            "https://api.example.com/base/visit"
        );
    }

    #[test]
    fn rejects_non_base_endpoints() {
        assert!(matches!(
            ApiClient::new("mailto:ops@example.com", NoToken),
            Err(ClientError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            ApiClient::new("not a url", NoToken),
            Err(ClientError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        let client = ApiClient::new("http://127.0.0.1:9/", StaticToken(String::new())).unwrap();
        assert!(matches!(client.get_visits().await, Err(ClientError::MissingToken)));

        let client = ApiClient::new("http://127.0.0.1:9/", NoToken).unwrap();
        assert!(matches!(client.get_time().await, Err(ClientError::MissingToken)));
    }
}
