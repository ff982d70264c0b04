use crate::api::resources::Action;
use crate::errors::ApiError;
use crate::state::AppState;
use authgate_core::Authorized;
use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Rejects requests without a live session and hands the caller's identity
/// to the handler as an [`Authorized`] extension.
pub(super) async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.gate.authorize(request.headers()).await {
        Ok(authorized) => {
            request.extensions_mut().insert(authorized);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Like [`authentication_middleware`], then asks the policy decider whether
/// the caller may perform the request's action on `{object}`.
pub(super) async fn authorization_middleware(
    State(state): State<AppState>,
    Path(object): Path<String>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(action) = Action::from_method(request.method()) else {
        return ApiError::new("Method not allowed", http::StatusCode::METHOD_NOT_ALLOWED)
            .into_response();
    };

    let result: Result<Authorized, _> = match &state.policy {
        Some(policy) => {
            state
                .gate
                .authorize_with_policy(request.headers(), &object, action.as_str(), policy.as_ref())
                .await
        }
        None => state.gate.authorize(request.headers()).await,
    };

    match result {
        Ok(authorized) => {
            request.extensions_mut().insert(authorized);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
