//! Token verification endpoint for the frontend.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    api::handlers::auth::{principal::require_auth, types::VerificarResponse},
    token::Keys,
};

#[utoipa::path(
    get,
    path = "/auth/verificar",
    responses(
        (status = 200, description = "Token is valid; decoded claims returned", body = VerificarResponse),
        (status = 401, description = "No bearer token on the request", body = crate::api::handlers::ErrorBody),
        (status = 403, description = "Malformed, expired or wrongly signed token", body = crate::api::handlers::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verificar(headers: HeaderMap, keys: Extension<Arc<Keys>>) -> Response {
    match require_auth(&headers, &keys) {
        Ok(claims) => (
            StatusCode::OK,
            Json(VerificarResponse {
                valid: true,
                user: claims,
            }),
        )
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
