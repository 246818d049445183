//! Middleware pipeline (spec §6.1): IP allow-list → bearer-token
//! verification → access-log insert. Tokens are JWTs signed with
//! `JWT_SECRET`, matching the `jwt.py` piece of `original_source/`.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Signs a 24-hour bearer token identifying `subject`.
pub fn issue_token(secret: &str, subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims { sub: subject.to_string(), exp };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .ok()
        .map(|data| data.claims)
}

fn bearer_from(req: &Request<Body>) -> Option<&str> {
    req.headers().get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

/// Rejects any peer not present in `AUTHORIZED_IPS`. An empty allow-list
/// (the variable unset) leaves every peer authorized — matching a
/// single-operator lab deployment with no network-level restriction
/// configured.
pub async fn ip_allowlist(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.authorized_ips.is_empty() && !state.authorized_ips.contains(&addr.ip()) {
        return StatusCode::FORBIDDEN.into_response();
    }
    next.run(req).await
}

/// Verifies the bearer token on every route except `/token/{id}`, which
/// issues the token in the first place.
pub async fn bearer_auth(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    match bearer_from(&req).and_then(|t| verify_token(&state.jwt_secret, t)) {
        Some(_) => next.run(req).await,
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Inserts one `access_logs` row per request, recording whether it was
/// authorized (by the time this returns, `bearer_auth` has already run, so
/// the response status reflects the outcome).
pub async fn access_log(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let identifier = bearer_from(&req).and_then(|t| verify_token(&state.jwt_secret, t)).map(|c| c.sub);

    let response = next.run(req).await;
    let authorized = response.status() != StatusCode::UNAUTHORIZED && response.status() != StatusCode::FORBIDDEN;

    let pool = state.pool.clone();
    tokio::spawn(async move {
        if let Err(e) = db::repository::access_logs::insert(&pool, &host, authorized, identifier.as_deref(), &path, &method).await {
            error!("failed to persist access log: {}", e);
        }
    });

    response
}

/// `/token/{id}` — localhost-only bearer-token issuance (spec §6.1).
pub async fn issue(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<String>,
) -> Result<String, StatusCode> {
    if !addr.ip().is_loopback() {
        return Err(StatusCode::FORBIDDEN);
    }
    issue_token(&state.jwt_secret, &id).map_err(|e| {
        error!("failed to issue token: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
