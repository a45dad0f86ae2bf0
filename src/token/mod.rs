//! Stateless session tokens.
//!
//! Claims are signed with a server-held secret (HS256) and expire 24 hours
//! after issuance. Nothing is persisted server-side; callers must treat the
//! decoded claims as a point-in-time snapshot of the account, not a live
//! view.

use chrono::{NaiveDate, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Tokens expire 24 hours after issuance.
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24;

#[derive(Debug, Error)]
pub enum Error {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Account kind carried in the `tipo` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Paciente,
    Profissional,
}

/// Signed claims bag.
///
/// Registration issues the identity fields only; login fills in the
/// paciente-specific fields so the client does not need a second round
/// trip. Absent optional fields are omitted from the encoded token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub id: i64,
    pub nome: String,
    pub email: Option<String>,
    pub tipo: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostico_previo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub painel_genetico: Option<String>,
    #[serde(rename = "idFamilia", default, skip_serializing_if = "Option::is_none")]
    pub id_familia: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_familia: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Identity-only claims, stamped with iat/exp as of now.
    #[must_use]
    pub fn new(id: i64, nome: String, email: Option<String>, tipo: Role) -> Self {
        let iat = Utc::now().timestamp();

        Self {
            id,
            nome,
            email,
            tipo,
            sexo: None,
            data_nascimento: None,
            diagnostico_previo: None,
            painel_genetico: None,
            id_familia: None,
            nome_familia: None,
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        }
    }
}

/// Keys derived from the server secret, shared across requests.
#[derive(Clone)]
pub struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign the claims into a bearer token.
    ///
    /// # Errors
    /// Returns an error if claims serialization or signing fails.
    pub fn issue(&self, claims: &Claims) -> Result<String, Error> {
        encode(&Header::default(), claims, &self.encoding).map_err(Error::Sign)
    }

    /// Verify a bearer token and return its decoded claims.
    ///
    /// # Errors
    /// Returns [`Error::Expired`] for expired tokens and [`Error::Invalid`]
    /// for anything malformed or signed with a different secret.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => Error::Expired,
                _ => Error::Invalid(err),
            })
    }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs and spans.
        f.debug_struct("Keys").finish_non_exhaustive()
    }
}
