use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use workhub_cache::{rate_limit_key, RateLimit};

/// 5 requests per 60 seconds per IP
pub const LOGIN_LIMIT: RateLimit = RateLimit::new(5, 60);

/// 20 requests per 60 seconds per IP across the token endpoints
pub const PUBLIC_TOKEN_LIMIT: RateLimit = RateLimit::new(20, 60);

#[derive(Debug, Serialize)]
struct RateLimitError {
    error: String,
    message: String,
    retry_after: u64,
}

/// Client IP for rate limiting. Proxy headers count only when the server
/// sits behind a trusted proxy; otherwise the peer address is used.
fn client_ip(request: &Request, trust_proxy_headers: bool) -> String {
    let forwarded = if trust_proxy_headers {
        forwarded_ip(request.headers())
    } else {
        None
    };

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

async fn enforce(
    state: &AppState,
    scope: &str,
    limit: RateLimit,
    request: Request,
    next: Next,
) -> Response {
    let Some(cache) = &state.cache else {
        return next.run(request).await;
    };

    let ip = client_ip(&request, state.trust_proxy_headers);
    match cache.hit(&rate_limit_key(scope, &ip), limit).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::warn!(scope, ip = %ip, "rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(RateLimitError {
                    error: "rate_limit_exceeded".to_string(),
                    message: format!(
                        "Too many requests. Please try again in {} seconds.",
                        limit.window_secs
                    ),
                    retry_after: limit.window_secs,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(scope, error = %e, "rate limit check failed");
            // fail open
            next.run(request).await
        }
    }
}

pub async fn rate_limit_login(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state, "login", LOGIN_LIMIT, request, next).await
}

pub async fn rate_limit_public(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state, "public", PUBLIC_TOKEN_LIMIT, request, next).await
}
