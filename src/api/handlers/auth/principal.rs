//! Bearer-token authentication for guarded endpoints.

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    api::handlers::error_response,
    token::{Claims, Keys, Role},
};

/// Why a guarded request was turned away.
#[derive(Debug)]
pub(crate) enum AuthRejection {
    /// No bearer token on the request.
    MissingToken,
    /// Malformed, expired or wrongly signed token.
    InvalidToken,
    /// Valid token, but the endpoint is paciente-only.
    NotPaciente,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingToken => {
                error_response(StatusCode::UNAUTHORIZED, "Token de acesso requerido")
            }
            Self::InvalidToken => error_response(StatusCode::FORBIDDEN, "Token inválido"),
            Self::NotPaciente => {
                error_response(StatusCode::FORBIDDEN, "Acesso restrito a pacientes")
            }
        }
    }
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Resolve the caller's claims from the `Authorization` header.
pub(crate) fn require_auth(headers: &HeaderMap, keys: &Keys) -> Result<Claims, AuthRejection> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(AuthRejection::MissingToken);
    };

    keys.verify(&token).map_err(|err| {
        debug!("Token rejected: {err}");
        AuthRejection::InvalidToken
    })
}

/// Like [`require_auth`], but only pacientes pass. Profile and family
/// state are defined for pacientes only.
pub(crate) fn require_paciente(headers: &HeaderMap, keys: &Keys) -> Result<Claims, AuthRejection> {
    let claims = require_auth(headers, keys)?;

    if claims.tipo == Role::Paciente {
        Ok(claims)
    } else {
        Err(AuthRejection::NotPaciente)
    }
}
