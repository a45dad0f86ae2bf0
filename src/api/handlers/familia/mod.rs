//! Family membership endpoints.
//!
//! An affiliated paciente belongs to exactly one família; the handlers
//! here move callers through that state machine (create, add member,
//! roster, leave) on top of the transactional helpers in [`storage`].

pub mod types;

mod storage;

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    api::handlers::{
        auth::{password, principal::require_paciente},
        error_response, internal_error, non_empty, valid_sexo,
    },
    token::Keys,
};
use self::storage::NewMembro;
use self::types::{
    AdicionarMembro, AdicionarMembroResponse, CriarFamilia, CriarFamiliaResponse,
    MinhaFamiliaResponse,
};

#[utoipa::path(
    post,
    path = "/familia",
    request_body = CriarFamilia,
    responses(
        (status = 201, description = "Família created with the caller as first member", body = CriarFamiliaResponse),
        (status = 400, description = "Missing name, duplicate name, or caller already affiliated", body = crate::api::handlers::ErrorBody),
        (status = 401, description = "No bearer token on the request", body = crate::api::handlers::ErrorBody),
        (status = 403, description = "Invalid token or not a paciente", body = crate::api::handlers::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "familia"
)]
#[instrument(skip_all)]
pub async fn criar_familia(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
    payload: Option<Json<CriarFamilia>>,
) -> Response {
    let claims = match require_paciente(&headers, &keys) {
        Ok(claims) => claims,
        Err(rejection) => return rejection.into_response(),
    };

    let nome_familia = payload.and_then(|Json(payload)| payload.nome_familia);
    let Some(nome_familia) = non_empty(nome_familia.as_ref()) else {
        return error_response(StatusCode::BAD_REQUEST, "Nome da família é obrigatório");
    };

    match storage::caller_family(&pool, claims.id).await {
        Ok(None) => (),
        Ok(Some(_)) => {
            return error_response(StatusCode::BAD_REQUEST, "Você já pertence a uma família")
        }
        Err(err) => return err.into_response(),
    }

    match storage::create_familia(&pool, claims.id, nome_familia).await {
        Ok(familia) => (
            StatusCode::CREATED,
            Json(CriarFamiliaResponse {
                message: "Família criada com sucesso".to_string(),
                familia,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/familia/membros",
    request_body = AdicionarMembro,
    responses(
        (status = 201, description = "Member attached to the caller's família", body = AdicionarMembroResponse),
        (status = 400, description = "Missing name, caller unaffiliated, or member belongs to another família", body = crate::api::handlers::ErrorBody),
        (status = 401, description = "No bearer token on the request", body = crate::api::handlers::ErrorBody),
        (status = 403, description = "Invalid token or not a paciente", body = crate::api::handlers::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "familia"
)]
#[instrument(skip_all)]
pub async fn adicionar_membro(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
    payload: Option<Json<AdicionarMembro>>,
) -> Response {
    let claims = match require_paciente(&headers, &keys) {
        Ok(claims) => claims,
        Err(rejection) => return rejection.into_response(),
    };

    let payload = match payload {
        Some(Json(payload)) => payload,
        None => AdicionarMembro {
            nome: None,
            data_nascimento: None,
            sexo: None,
            email: None,
        },
    };

    let Some(nome) = non_empty(payload.nome.as_ref()) else {
        return error_response(StatusCode::BAD_REQUEST, "Nome é obrigatório");
    };

    // Optional fields are validated only when present; roster-only
    // entries may omit all of them.
    let sexo = non_empty(payload.sexo.as_ref());
    if let Some(sexo) = sexo {
        if !valid_sexo(sexo) {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Sexo deve ser \"M\" (masculino) ou \"F\" (feminino)",
            );
        }
    }

    let data_nascimento = match non_empty(payload.data_nascimento.as_ref()) {
        Some(raw) => match raw.parse::<chrono::NaiveDate>() {
            Ok(data) => Some(data),
            Err(_) => {
                return error_response(StatusCode::BAD_REQUEST, "Data de nascimento inválida")
            }
        },
        None => None,
    };

    let familia_id = match storage::caller_family(&pool, claims.id).await {
        Ok(Some(familia_id)) => familia_id,
        Ok(None) => {
            return error_response(StatusCode::BAD_REQUEST, "Você não pertence a nenhuma família")
        }
        Err(err) => return err.into_response(),
    };

    // New rows get the unsatisfiable credential so they can never log in.
    let senha_hash = match password::roster_only_credential() {
        Ok(hash) => hash,
        Err(err) => {
            error!("Error hashing roster credential: {err:?}");
            return internal_error();
        }
    };

    let membro = NewMembro {
        nome,
        data_nascimento,
        sexo,
        email: non_empty(payload.email.as_ref()),
        senha_hash: &senha_hash,
    };

    match storage::add_membro(&pool, familia_id, membro).await {
        Ok(membro) => (
            StatusCode::CREATED,
            Json(AdicionarMembroResponse {
                message: "Membro adicionado com sucesso".to_string(),
                membro,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/minha-familia",
    responses(
        (status = 200, description = "Caller's família with full roster, or null when unaffiliated", body = MinhaFamiliaResponse),
        (status = 401, description = "No bearer token on the request", body = crate::api::handlers::ErrorBody),
        (status = 403, description = "Invalid token or not a paciente", body = crate::api::handlers::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "familia"
)]
#[instrument(skip_all)]
pub async fn minha_familia(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
) -> Response {
    let claims = match require_paciente(&headers, &keys) {
        Ok(claims) => claims,
        Err(rejection) => return rejection.into_response(),
    };

    match storage::fetch_minha_familia(&pool, claims.id).await {
        Ok(familia) => (StatusCode::OK, Json(MinhaFamiliaResponse { familia })).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/familia/sair",
    responses(
        (status = 200, description = "Caller detached from their família", body = crate::api::handlers::Mensagem),
        (status = 401, description = "No bearer token on the request", body = crate::api::handlers::ErrorBody),
        (status = 403, description = "Invalid token or not a paciente", body = crate::api::handlers::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "familia"
)]
#[instrument(skip_all)]
pub async fn sair_familia(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
) -> Response {
    let claims = match require_paciente(&headers, &keys) {
        Ok(claims) => claims,
        Err(rejection) => return rejection.into_response(),
    };

    match storage::leave_familia(&pool, claims.id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Você saiu da família com sucesso" })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
