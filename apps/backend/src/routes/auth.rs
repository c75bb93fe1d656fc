//! Authentication and rate-limit middleware

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::AppState;

/// Authenticated learner info stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedLearner {
    pub learner_id: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Auth middleware - extracts learner token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    if !request.headers().contains_key(AUTHORIZATION) {
        return Err(ApiError::Unauthorized(
            "Missing Authorization header".to_string(),
        ));
    }

    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?
        .to_string();

    let learner = state
        .db
        .get_learner_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid learner token".to_string()))?;

    state.db.update_last_seen(learner.id).await?;

    request.extensions_mut().insert(AuthenticatedLearner {
        learner_id: learner.id,
    });

    Ok(next.run(request).await)
}

/// Identify the client for rate limiting by network address.
///
/// Bearer tokens are not verified yet at this point, so they never pick the
/// bucket. `X-Forwarded-For` is only honoured behind a trusted proxy.
fn client_key(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return format!("ip:{ip}");
        }
    }
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "anonymous".to_string(),
    }
}

/// Rate-limit middleware backed by the shared `RateLimiter`
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let key = client_key(&request, state.trust_forwarded_for);

    if let Err(retry_after) = state.rate_limiter.check(&key, Instant::now()) {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return Err(ApiError::TooManyRequests {
            retry_after_secs: retry_after.as_secs().max(1),
        });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/progress/due");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_client_key_ignores_bearer_token() {
        let a = request(&[("authorization", "Bearer abc")]);
        let b = request(&[("authorization", "Bearer xyz")]);
        assert_eq!(client_key(&a, false), "anonymous");
        assert_eq!(client_key(&a, false), client_key(&b, false));
    }

    #[test]
    fn test_client_key_uses_peer_address() {
        let mut req = request(&[("authorization", "Bearer abc")]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 9], 4000))));
        assert_eq!(client_key(&req, false), "ip:192.168.1.9");
    }

    #[test]
    fn test_client_key_forwarded_only_when_trusted() {
        let req = request(&[("x-forwarded-for", "10.0.0.1, 192.168.1.1")]);
        assert_eq!(client_key(&req, true), "ip:10.0.0.1");
        assert_eq!(client_key(&req, false), "anonymous");
    }

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
