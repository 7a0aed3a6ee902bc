use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, LogoutResponse, RegisterRequest, UserDto},
        extractors::AuthUser,
        services::validate_credentials,
    },
    error::{ApiError, AuthError},
    state::AppState,
};

pub const REFRESH_COOKIE: &str = "refreshToken";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/registration", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/activate/:link", get(activate))
        .route("/refresh", get(refresh))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", get(get_users))
}

fn refresh_cookie(token: &str, max_age: Duration) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(&format!(
        "{REFRESH_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        max_age.as_secs()
    ))
    .map_err(|e| AuthError::Internal(e.into()))
}

fn cleared_cookie() -> HeaderValue {
    HeaderValue::from_static("refreshToken=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax")
}

/// Finds the refresh token among all `Cookie` headers.
pub(crate) fn read_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

/// JSON body plus a `Set-Cookie` carrying the refresh token.
fn with_session_cookie(
    state: &AppState,
    body: AuthResponse,
) -> Result<impl IntoResponse, ApiError> {
    let cookie = refresh_cookie(&body.refresh_token, state.accounts.tokens().refresh_ttl())
        .map_err(|e| e.localize(state.config.locale))?;
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = state.config.locale;
    let email = validate_credentials(&payload.email, &payload.password)
        .map_err(|e| e.localize(locale))?;
    let body = state
        .accounts
        .register(&email, &payload.password)
        .await
        .map_err(|e| e.localize(locale))?;
    with_session_cookie(&state, body)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = state.config.locale;
    let email = payload.email.trim().to_lowercase();
    let body = state
        .accounts
        .login(&email, &payload.password)
        .await
        .map_err(|e| e.localize(locale))?;
    with_session_cookie(&state, body)
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let removed = match read_refresh_cookie(&headers) {
        Some(token) => state
            .accounts
            .logout(&token)
            .await
            .map_err(|e| e.localize(state.config.locale))?,
        None => 0,
    };
    Ok((
        [(header::SET_COOKIE, cleared_cookie())],
        Json(LogoutResponse { removed }),
    ))
}

#[instrument(skip_all)]
pub async fn activate(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> Result<Redirect, ApiError> {
    state
        .accounts
        .activate(&link)
        .await
        .map_err(|e| e.localize(state.config.locale))?;
    Ok(Redirect::to(&state.config.client_url))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = read_refresh_cookie(&headers);
    let body = state
        .accounts
        .refresh(token.as_deref())
        .await
        .map_err(|e| e.localize(state.config.locale))?;
    with_session_cookie(&state, body)
}

#[instrument(skip_all, fields(user_id = %caller.0.sub))]
pub async fn get_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state
        .accounts
        .get_users()
        .await
        .map_err(|e| e.localize(state.config.locale))?;
    Ok(Json(users))
}
