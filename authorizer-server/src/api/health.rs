use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::info;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Basic health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Value>,
    #[serde(skip)]
    status_code: StatusCode,
}

impl IntoResponse for Health {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Liveness check handler
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is alive", body = Health)
    )
)]
async fn health_check() -> Health {
    Health {
        status: "ok",
        components: None,
        status_code: StatusCode::OK,
    }
}

/// Readiness check handler, ready once the signing secret resolves
#[utoipa::path(
    get,
    path = "/ready",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is ready", body = Health),
        (status = 503, description = "Signing secret cannot be resolved", body = Health)
    )
)]
async fn ready_check(State(state): State<AppState>) -> Health {
    match state.health_check().await {
        Ok(secret) => Health {
            status: "ok",
            components: Some(serde_json::json!({
                "secret": {
                    "status": "ok",
                    "source": format!("{:?}", secret.source()).to_lowercase(),
                    "fetched_at": secret.fetched_at().to_rfc3339(),
                }
            })),
            status_code: StatusCode::OK,
        },
        Err(e) => {
            info!("Readiness check failed: {e}");
            Health {
                status: "error",
                components: Some(serde_json::json!({
                    "secret": {
                        "status": "error",
                        "error": e.to_string(),
                    }
                })),
                status_code: StatusCode::SERVICE_UNAVAILABLE,
            }
        }
    }
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(ready_check))
}
