use crate::errors::ApiError;
use crate::headers::presets;
use crate::openapi::AUTH_TAG;
use crate::state::AppState;
use authgate_core::oauth::{clear_cookie, CallbackParams};
use authgate_core::{bearer_token, AuthError, TokenPair};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Token pair handed to the client after login or refresh
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token expiry, unix seconds
    pub access_expires_at: i64,
    /// Refresh token expiry, unix seconds
    pub refresh_expires_at: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// Body of a refresh request
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct RefreshRequest {
    pub refresh_token: String,
}

fn token_response(pair: TokenPair) -> Response {
    let mut response = (StatusCode::OK, Json(TokenResponse::from(pair))).into_response();
    presets::no_store().apply(&mut response);
    response
}

#[utoipa::path(
    get,
    path = "/auth/{provider}/login",
    tag = AUTH_TAG,
    params(("provider" = String, Path, description = "Registered identity provider, e.g. google")),
    responses(
        (status = 307, description = "Redirect to the provider's consent page"),
        (status = 404, description = "Unknown provider")
    )
)]
async fn login_handler(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    match state.oauth.begin_login(&provider) {
        Ok(redirect) => {
            let mut response = Redirect::temporary(&redirect.url).into_response();
            match HeaderValue::from_str(&redirect.set_cookie) {
                Ok(cookie) => {
                    response.headers_mut().insert(SET_COOKIE, cookie);
                    response
                }
                Err(e) => ApiError::internal(format!("Invalid anti-forgery cookie: {e}"))
                    .into_response(),
            }
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    tag = AUTH_TAG,
    params(
        ("provider" = String, Path, description = "Provider that issued the code"),
        ("state" = String, Query, description = "Anti-forgery state echoed by the provider"),
        ("code" = String, Query, description = "Authorization code")
    ),
    responses(
        (status = 200, description = "Login completed", body = TokenResponse),
        (status = 401, description = "Login rejected"),
        (status = 404, description = "Unknown provider")
    )
)]
async fn callback_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    query: Result<Query<CallbackParams>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let result = match query {
        Ok(Query(params)) => state.oauth.complete_login(&provider, &params, &headers).await,
        Err(rejection) => {
            warn!("Malformed callback query for '{}': {}", provider, rejection);
            Err(AuthError::MissingOrInvalidState)
        }
    };
    let mut response = match result {
        Ok(pair) => {
            info!("Login via '{}' completed", provider);
            token_response(pair)
        }
        Err(err) => ApiError::from(err).into_response(),
    };

    // The state is single use, whatever the outcome
    if let Ok(cookie) = HeaderValue::from_str(&clear_cookie(state.oauth.secure_cookies())) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = AUTH_TAG,
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Both tokens of the session were revoked"),
        (status = 401, description = "Missing, invalid or already revoked session")
    )
)]
async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = match bearer_token(&headers) {
        Ok(token) => state.sessions.destroy_session(token).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = AUTH_TAG,
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session rotated", body = TokenResponse),
        (status = 401, description = "Invalid, expired or already used refresh token"),
        (status = 422, description = "Invalid request payload")
    )
)]
async fn refresh_handler(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Response {
    match state.sessions.refresh_session(&request.refresh_token).await {
        Ok(pair) => token_response(pair),
        Err(err) => {
            warn!("Refresh failed: {}", err);
            ApiError::from(err).into_response()
        }
    }
}

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(login_handler))
        .routes(routes!(callback_handler))
        .routes(routes!(logout_handler))
        .routes(routes!(refresh_handler))
}
