use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const AUTHORIZER_TAG: &str = "Authorizer API";
pub(crate) const TOKEN_TAG: &str = "Token API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Liveness and readiness endpoints"),
        (name = AUTHORIZER_TAG, description = "Per-request access decisions"),
        (name = TOKEN_TAG, description = "Credential issuance"),
    ),
    info(
        title = "Authorizer API",
        description = "Request authorization and credential issuance service",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
