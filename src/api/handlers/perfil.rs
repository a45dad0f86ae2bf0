//! Authenticated profile update for pacientes.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::{
    api::handlers::{auth::principal::require_paciente, internal_error},
    token::Keys,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AtualizarPerfil {
    pub diagnostico_previo: Option<String>,
    pub painel_genetico: Option<String>,
}

#[utoipa::path(
    put,
    path = "/perfil",
    request_body = AtualizarPerfil,
    responses(
        (status = 200, description = "Profile updated", body = crate::api::handlers::Mensagem),
        (status = 401, description = "No bearer token on the request", body = crate::api::handlers::ErrorBody),
        (status = 403, description = "Invalid token or not a paciente", body = crate::api::handlers::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::api::handlers::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "perfil"
)]
#[instrument(skip_all)]
pub async fn atualizar_perfil(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
    payload: Option<Json<AtualizarPerfil>>,
) -> Response {
    let claims = match require_paciente(&headers, &keys) {
        Ok(claims) => claims,
        Err(rejection) => return rejection.into_response(),
    };

    // Both fields are always written; an absent field clears the column.
    let (diagnostico_previo, painel_genetico) = match payload {
        Some(Json(payload)) => (payload.diagnostico_previo, payload.painel_genetico),
        None => (None, None),
    };

    let result = sqlx::query(
        r"
        UPDATE paciente
        SET diagnostico_previo = $1, painel_genetico = $2
        WHERE id_paciente = $3
        ",
    )
    .bind(diagnostico_previo)
    .bind(painel_genetico)
    .bind(claims.id)
    .execute(&*pool)
    .await;

    match result {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Perfil atualizado com sucesso" })),
        )
            .into_response(),
        Err(err) => {
            error!("Error updating perfil: {err:?}");
            internal_error()
        }
    }
}
