//! Request and response bodies for the auth endpoints.
//!
//! Field names follow the wire format the frontend speaks (`nome`,
//! `senha`, `data_nascimento`, `idFamilia`, …). Request fields are all
//! optional so that presence checks can produce the documented messages
//! instead of serde rejections.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::token::{Claims, Role};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CadastroPaciente {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
    pub sexo: Option<String>,
    pub data_nascimento: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CadastroProfissional {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct Login {
    pub email: Option<String>,
    pub senha: Option<String>,
}

/// Public view of an account; never carries the stored hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UserResponse {
    Paciente(PacienteUser),
    Profissional(ProfissionalUser),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PacienteUser {
    pub id: i64,
    pub nome: String,
    pub email: Option<String>,
    pub tipo: Role,
    pub sexo: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub diagnostico_previo: Option<String>,
    pub painel_genetico: Option<String>,
    #[serde(rename = "idFamilia")]
    pub id_familia: Option<i64>,
    pub nome_familia: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfissionalUser {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub tipo: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerificarResponse {
    pub valid: bool,
    pub user: Claims,
}
