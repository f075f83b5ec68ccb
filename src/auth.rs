use std::collections::HashMap;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::AppState;
use crate::error::ApiError;

/// Identity established from a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

/// Validates bearer tokens issued by the identity provider.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Principal>;
}

/// Verifier accepting a fixed set of tokens, each bound to a subject.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).map(|subject| Principal {
            subject: subject.clone(),
        })
    }
}

/// Gate for protected routes: passes when authorization is disabled,
/// otherwise requires a bearer token the verifier accepts.
///
/// Holds `None` when the gate was open because authorization is disabled.
pub struct Authorized(pub Option<Principal>);

impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.authorization_disabled {
            return Ok(Authorized(None));
        }

        let rejected = || ApiError::Unauthorized {
            source: "authorization",
        };
        let token = bearer_token(&parts.headers).ok_or_else(rejected)?;
        let principal = state.verifier.verify(token).ok_or_else(|| {
            tracing::warn!("Rejected bearer token");
            rejected()
        })?;

        Ok(Authorized(Some(principal)))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
