use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const AUTH_TAG: &str = "Authentication API";
pub(crate) const RESOURCES_TAG: &str = "Resources API";

pub(crate) const BEARER_SCHEME: &str = "bearer";

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&BearerSecurity),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = AUTH_TAG, description = "Login, logout and token refresh endpoints"),
        (name = RESOURCES_TAG, description = "Endpoints guarded by the authorization gate"),
    ),
    info(
        title = "Authgate API",
        description = "Session and authorization service",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
