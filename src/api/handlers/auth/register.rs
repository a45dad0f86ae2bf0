//! Account registration for both identity kinds.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    api::handlers::{
        auth::{
            password,
            storage::{self, IdentityKind},
            types::{
                AuthResponse, CadastroPaciente, CadastroProfissional, PacienteUser,
                ProfissionalUser, UserResponse,
            },
        },
        error_response, internal_error, non_empty, valid_data_nascimento, valid_email,
        valid_senha, valid_sexo,
    },
    token::{Claims, Keys, Role},
};

#[utoipa::path(
    post,
    path = "/auth/paciente/cadastro",
    request_body = CadastroPaciente,
    responses(
        (status = 201, description = "Paciente registered", body = AuthResponse),
        (status = 400, description = "Validation failure or email already registered", body = crate::api::handlers::ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn cadastro_paciente(
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
    payload: Option<Json<CadastroPaciente>>,
) -> Response {
    let payload = match payload {
        Some(Json(payload)) => payload,
        None => CadastroPaciente {
            nome: None,
            email: None,
            senha: None,
            sexo: None,
            data_nascimento: None,
        },
    };

    // Required-field check first so the combined message matches the form.
    let (Some(nome), Some(email), Some(senha), Some(sexo), Some(data_nascimento)) = (
        non_empty(payload.nome.as_ref()),
        non_empty(payload.email.as_ref()),
        non_empty(payload.senha.as_ref()),
        non_empty(payload.sexo.as_ref()),
        non_empty(payload.data_nascimento.as_ref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Nome, email, senha, sexo e data de nascimento são obrigatórios",
        );
    };

    if !valid_email(email) {
        return error_response(StatusCode::BAD_REQUEST, "Formato de email inválido");
    }

    if !valid_sexo(sexo) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Sexo deve ser \"M\" (masculino) ou \"F\" (feminino)",
        );
    }

    let Ok(data_nascimento) = data_nascimento.parse::<chrono::NaiveDate>() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Data de nascimento inválida. Deve ser uma data válida e a pessoa deve ter entre 1 e 120 anos.",
        );
    };
    if !valid_data_nascimento(data_nascimento) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Data de nascimento inválida. Deve ser uma data válida e a pessoa deve ter entre 1 e 120 anos.",
        );
    }

    if !valid_senha(senha) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Senha deve conter pelo menos 8 caracteres, 1 letra maiúscula, 1 número e 1 símbolo (@$!%*?&)",
        );
    }

    match storage::email_registered(&pool, email).await {
        Ok(Some(kind)) => return duplicate_email(kind),
        Ok(None) => (),
        Err(err) => {
            error!("Error checking if email is registered: {err:?}");
            return internal_error();
        }
    }

    let senha_hash = match password::hash_senha(senha) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Error hashing password: {err:?}");
            return internal_error();
        }
    };

    let id = match storage::insert_paciente(&pool, nome, email, &senha_hash, sexo, data_nascimento)
        .await
    {
        Ok(id) => id,
        // Lost a race against a concurrent registration with the same email.
        Err(err) if storage::is_unique_violation(&err) => {
            return duplicate_email(IdentityKind::Paciente)
        }
        Err(err) => {
            error!("Error inserting paciente: {err:?}");
            return internal_error();
        }
    };

    let claims = Claims::new(id, nome.to_string(), Some(email.to_string()), Role::Paciente);
    let token = match keys.issue(&claims) {
        Ok(token) => token,
        Err(err) => {
            error!("Error issuing token: {err:?}");
            return internal_error();
        }
    };

    let response = AuthResponse {
        message: "Paciente cadastrado com sucesso".to_string(),
        token,
        user: UserResponse::Paciente(PacienteUser {
            id,
            nome: nome.to_string(),
            email: Some(email.to_string()),
            tipo: Role::Paciente,
            sexo: Some(sexo.to_string()),
            data_nascimento: Some(data_nascimento),
            diagnostico_previo: None,
            painel_genetico: None,
            id_familia: None,
            nome_familia: None,
        }),
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/auth/profissional/cadastro",
    request_body = CadastroProfissional,
    responses(
        (status = 201, description = "Profissional registered", body = AuthResponse),
        (status = 400, description = "Validation failure or email already registered", body = crate::api::handlers::ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn cadastro_profissional(
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
    payload: Option<Json<CadastroProfissional>>,
) -> Response {
    let payload = match payload {
        Some(Json(payload)) => payload,
        None => CadastroProfissional {
            nome: None,
            email: None,
            senha: None,
        },
    };

    let (Some(nome), Some(email), Some(senha)) = (
        non_empty(payload.nome.as_ref()),
        non_empty(payload.email.as_ref()),
        non_empty(payload.senha.as_ref()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Nome, email e senha são obrigatórios");
    };

    if !valid_email(email) {
        return error_response(StatusCode::BAD_REQUEST, "Formato de email inválido");
    }

    if !valid_senha(senha) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Senha deve conter pelo menos 8 caracteres, 1 letra maiúscula, 1 número e 1 símbolo (@$!%*?&)",
        );
    }

    match storage::email_registered(&pool, email).await {
        Ok(Some(kind)) => return duplicate_email(kind),
        Ok(None) => (),
        Err(err) => {
            error!("Error checking if email is registered: {err:?}");
            return internal_error();
        }
    }

    let senha_hash = match password::hash_senha(senha) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Error hashing password: {err:?}");
            return internal_error();
        }
    };

    let id = match storage::insert_profissional(&pool, nome, email, &senha_hash).await {
        Ok(id) => id,
        Err(err) if storage::is_unique_violation(&err) => {
            return duplicate_email(IdentityKind::Profissional)
        }
        Err(err) => {
            error!("Error inserting profissional: {err:?}");
            return internal_error();
        }
    };

    let claims = Claims::new(
        id,
        nome.to_string(),
        Some(email.to_string()),
        Role::Profissional,
    );
    let token = match keys.issue(&claims) {
        Ok(token) => token,
        Err(err) => {
            error!("Error issuing token: {err:?}");
            return internal_error();
        }
    };

    let response = AuthResponse {
        message: "Profissional de saúde cadastrado com sucesso".to_string(),
        token,
        user: UserResponse::Profissional(ProfissionalUser {
            id,
            nome: nome.to_string(),
            email: email.to_string(),
            tipo: Role::Profissional,
        }),
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

fn duplicate_email(kind: IdentityKind) -> Response {
    let message = match kind {
        IdentityKind::Paciente => "Email já cadastrado como paciente",
        IdentityKind::Profissional => "Email já cadastrado como profissional",
    };

    error_response(StatusCode::BAD_REQUEST, message)
}
