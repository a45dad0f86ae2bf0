//! Login across both identity kinds.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::{
    api::handlers::{
        auth::{
            password,
            storage::{self, Identity},
            types::{AuthResponse, Login, PacienteUser, ProfissionalUser, UserResponse},
        },
        error_response, internal_error, non_empty,
    },
    token::{Claims, Keys, Role},
};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = Login,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password", body = crate::api::handlers::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::api::handlers::ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    keys: Extension<Arc<Keys>>,
    payload: Option<Json<Login>>,
) -> Response {
    let payload = match payload {
        Some(Json(payload)) => payload,
        None => Login {
            email: None,
            senha: None,
        },
    };

    // Rejecting empty passwords here is what makes roster-only
    // credentials (bcrypt of the empty string) unsatisfiable.
    let (Some(email), Some(senha)) = (
        non_empty(payload.email.as_ref()),
        non_empty(payload.senha.as_ref()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Email e senha são obrigatórios");
    };

    let identity = match storage::find_identity_by_email(&pool, email).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            debug!("Unknown email");
            return invalid_credentials();
        }
        Err(err) => {
            error!("Error looking up credentials: {err:?}");
            return internal_error();
        }
    };

    // One generic error for both factors; never reveal which failed.
    match identity {
        Identity::Paciente(record) => {
            if !password::verify_senha(senha, &record.senha) {
                debug!("Password mismatch");
                return invalid_credentials();
            }

            let mut claims = Claims::new(
                record.id_paciente,
                record.nome.clone(),
                record.email.clone(),
                Role::Paciente,
            );
            claims.sexo = record.sexo.clone();
            claims.data_nascimento = record.data_nascimento;
            claims.diagnostico_previo = record.diagnostico_previo.clone();
            claims.painel_genetico = record.painel_genetico.clone();
            claims.id_familia = record.id_familia;
            claims.nome_familia = record.nome_familia.clone();

            let token = match keys.issue(&claims) {
                Ok(token) => token,
                Err(err) => {
                    error!("Error issuing token: {err:?}");
                    return internal_error();
                }
            };

            let response = AuthResponse {
                message: "Login realizado com sucesso".to_string(),
                token,
                user: UserResponse::Paciente(PacienteUser {
                    id: record.id_paciente,
                    nome: record.nome,
                    email: record.email,
                    tipo: Role::Paciente,
                    sexo: record.sexo,
                    data_nascimento: record.data_nascimento,
                    diagnostico_previo: record.diagnostico_previo,
                    painel_genetico: record.painel_genetico,
                    id_familia: record.id_familia,
                    nome_familia: record.nome_familia,
                }),
            };

            (StatusCode::OK, Json(response)).into_response()
        }
        Identity::Profissional(record) => {
            if !password::verify_senha(senha, &record.senha) {
                debug!("Password mismatch");
                return invalid_credentials();
            }

            let claims = Claims::new(
                record.id_profissional,
                record.nome.clone(),
                Some(record.email.clone()),
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
                message: "Login realizado com sucesso".to_string(),
                token,
                user: UserResponse::Profissional(ProfissionalUser {
                    id: record.id_profissional,
                    nome: record.nome,
                    email: record.email,
                    tipo: Role::Profissional,
                }),
            };

            (StatusCode::OK, Json(response)).into_response()
        }
    }
}

fn invalid_credentials() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Credenciais inválidas")
}
