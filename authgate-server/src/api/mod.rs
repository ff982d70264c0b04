mod auth;
mod authn_middleware;
pub(crate) mod health;
mod me;
mod resources;

use crate::api::authn_middleware::{authentication_middleware, authorization_middleware};
use crate::state::AppState;
use axum::middleware;
use utoipa_axum::router::OpenApiRouter;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(authenticated_routes(state))
        .merge(policy_routes(state))
}

/// Routes that only require a live session
fn authenticated_routes(state: &AppState) -> OpenApiRouter<AppState> {
    me::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        authentication_middleware,
    ))
}

/// Routes that additionally consult the policy decider when one is configured
fn policy_routes(state: &AppState) -> OpenApiRouter<AppState> {
    resources::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        authorization_middleware,
    ))
}
