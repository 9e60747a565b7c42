use crate::cache::DecisionCache;
use crate::headers::{presets, ClientCacheControl};
use crate::models::{AuthorizerRequest, AuthorizerResponse};
use crate::openapi::AUTHORIZER_TAG;
use crate::state::AppState;
use authorizer::{AccessDecision, Effect, PolicyGenerator, ANONYMOUS_PRINCIPAL};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::CACHE_CONTROL;
use http::{HeaderMap, StatusCode};
use log::{debug, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const TOKEN_EVENT_TYPE: &str = "TOKEN";

/// Decide whether the credential may invoke the requested API stage.
///
/// Always answers 200 with a policy; failures of any kind produce Deny.
#[utoipa::path(
    post,
    path = "/authorize",
    tag = AUTHORIZER_TAG,
    request_body = AuthorizerRequest,
    params(
        ("Cache-Control" = Option<String>, Header, description = "`no-cache` bypasses the decision cache")
    ),
    responses(
        (status = 200, description = "Access decision", body = AuthorizerResponse),
    )
)]
pub(super) async fn authorize_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AuthorizerRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Denying unparseable authorizer event: {rejection}");
            let decision = PolicyGenerator::new().generate(ANONYMOUS_PRINCIPAL, Effect::Deny, "");
            return decision_response(&decision);
        }
    };

    if let Some(kind) = request.kind.as_deref().filter(|k| *k != TOKEN_EVENT_TYPE) {
        debug!("Authorizer event of type '{kind}', reading authorizationToken anyway");
    }

    let credential = request.authorization_token.unwrap_or_default();
    let method_arn = request.method_arn.unwrap_or_default();
    let key = DecisionCache::key(&credential, &PolicyGenerator::scope(&method_arn));

    let use_cache =
        ClientCacheControl::from_header_value(headers.get(CACHE_CONTROL)).should_use_cache();
    if use_cache {
        if let Some(decision) = state.decisions.get(&key).await {
            debug!("Serving cached decision for '{}'", decision.principal_id());
            return decision_response(&decision);
        }
    }

    let (decision, expires_at) = state
        .gateway
        .authorize_with_expiry(&credential, &method_arn)
        .await;
    state.decisions.insert(key, &decision, expires_at).await;
    decision_response(&decision)
}

fn decision_response(decision: &AccessDecision) -> Response {
    let mut response = (StatusCode::OK, Json(AuthorizerResponse::from(decision))).into_response();
    presets::no_cache().apply(&mut response);
    response
}

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(authorize_handler))
}
