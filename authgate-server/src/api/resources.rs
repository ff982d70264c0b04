use crate::openapi::RESOURCES_TAG;
use authgate_core::Authorized;
use axum::extract::{Extension, Path};
use axum::Json;
use http::Method;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Action checked against the policy for a resource request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    pub(crate) fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(Action::Read),
            Method::POST | Method::PUT | Method::PATCH => Some(Action::Write),
            Method::DELETE => Some(Action::Delete),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

/// The decision the gate made for this request
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub(crate) struct ResourceAccess {
    /// Canonical subject of the caller
    subject: String,
    object: String,
    action: String,
}

fn granted(authorized: Authorized, object: String, action: Action) -> Json<ResourceAccess> {
    Json(ResourceAccess {
        subject: authorized.subject.to_string(),
        object,
        action: action.as_str().to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/resources/{object}",
    tag = RESOURCES_TAG,
    params(("object" = String, Path, description = "Object the caller wants to read")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Access granted", body = ResourceAccess),
        (status = 401, description = "Missing session or denied by policy")
    )
)]
async fn read_resource(
    Extension(authorized): Extension<Authorized>,
    Path(object): Path<String>,
) -> Json<ResourceAccess> {
    granted(authorized, object, Action::Read)
}

#[utoipa::path(
    post,
    path = "/resources/{object}",
    tag = RESOURCES_TAG,
    params(("object" = String, Path, description = "Object the caller wants to create")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Access granted", body = ResourceAccess),
        (status = 401, description = "Missing session or denied by policy")
    )
)]
async fn create_resource(
    Extension(authorized): Extension<Authorized>,
    Path(object): Path<String>,
) -> Json<ResourceAccess> {
    granted(authorized, object, Action::Write)
}

#[utoipa::path(
    put,
    path = "/resources/{object}",
    tag = RESOURCES_TAG,
    params(("object" = String, Path, description = "Object the caller wants to update")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Access granted", body = ResourceAccess),
        (status = 401, description = "Missing session or denied by policy")
    )
)]
async fn update_resource(
    Extension(authorized): Extension<Authorized>,
    Path(object): Path<String>,
) -> Json<ResourceAccess> {
    granted(authorized, object, Action::Write)
}

#[utoipa::path(
    delete,
    path = "/resources/{object}",
    tag = RESOURCES_TAG,
    params(("object" = String, Path, description = "Object the caller wants to delete")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Access granted", body = ResourceAccess),
        (status = 401, description = "Missing session or denied by policy")
    )
)]
async fn delete_resource(
    Extension(authorized): Extension<Authorized>,
    Path(object): Path<String>,
) -> Json<ResourceAccess> {
    granted(authorized, object, Action::Delete)
}

pub(super) fn router<S>() -> OpenApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    OpenApiRouter::new().routes(routes!(
        read_resource,
        create_resource,
        update_resource,
        delete_resource
    ))
}
