use crate::headers::presets;
use crate::openapi::AUTH_TAG;
use authgate_core::Authorized;
use axum::extract::Extension;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Identity of the caller as recorded in its access token
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct Me {
    /// Canonical subject
    subject: String,
    /// All claims of the access token, including `uuid` and `exp`
    #[schema(value_type = Object)]
    claims: Map<String, Value>,
}

#[utoipa::path(
    get,
    path = "/me",
    tag = AUTH_TAG,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Claims of the current session", body = Me),
        (status = 401, description = "Missing or invalid session")
    )
)]
async fn me_handler(Extension(authorized): Extension<Authorized>) -> Response {
    let me = Me {
        subject: authorized.subject.to_string(),
        claims: authorized.claims.into_map(),
    };
    let mut response = Json(me).into_response();
    presets::no_store().apply(&mut response);
    response
}

pub(super) fn router<S>() -> OpenApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    OpenApiRouter::new().routes(routes!(me_handler))
}
