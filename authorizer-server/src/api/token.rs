use crate::errors::ApiError;
use crate::headers::{cors_headers, presets};
use crate::models::{TokenRequest, TokenResponse};
use crate::openapi::TOKEN_TAG;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use log::debug;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Mint a signed credential for an identity proven upstream
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = TOKEN_TAG,
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Credential issued", body = TokenResponse),
        (status = 400, description = "Missing userId or authToken"),
        (status = 500, description = "Signing secret unavailable"),
    )
)]
pub(super) async fn token_handler(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Response {
    match issue(&state, payload).await {
        Ok(body) => {
            let mut response = (StatusCode::OK, Json(body)).into_response();
            presets::no_store().apply(&mut response);
            response
        }
        Err(err) => err.into_response(),
    }
}

async fn issue(
    state: &AppState,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<TokenResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let issued = state
        .issuer
        .issue(
            request.user_id.as_deref().unwrap_or_default(),
            request.auth_token.as_deref(),
        )
        .await?;
    Ok(issued.into())
}

/// CORS preflight
#[utoipa::path(
    options,
    path = "/auth/token",
    tag = TOKEN_TAG,
    responses(
        (status = 204, description = "Cross-origin request permitted"),
    )
)]
pub(super) async fn token_preflight_handler() -> StatusCode {
    debug!("Answering token preflight");
    StatusCode::NO_CONTENT
}

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(token_handler, token_preflight_handler))
        .layer(middleware::map_response(cors_headers))
}
