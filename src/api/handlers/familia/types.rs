//! Request and response bodies for the family endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CriarFamilia {
    pub nome_familia: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdicionarMembro {
    pub nome: Option<String>,
    pub data_nascimento: Option<String>,
    pub sexo: Option<String>,
    /// Optional: members without an email are roster-only entries.
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FamiliaCriada {
    pub id: i64,
    pub nome_familia: String,
    pub criador_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CriarFamiliaResponse {
    pub message: String,
    pub familia: FamiliaCriada,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MembroAdicionado {
    pub id: i64,
    pub nome: String,
    pub data_nascimento: Option<NaiveDate>,
    pub sexo: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "idFamilia")]
    pub id_familia: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdicionarMembroResponse {
    pub message: String,
    pub membro: MembroAdicionado,
}

/// Roster row; credential material is projected out at the query.
#[derive(Debug, Serialize, ToSchema)]
pub struct Membro {
    #[serde(rename = "idPaciente")]
    pub id_paciente: i64,
    pub nome: String,
    pub data_nascimento: Option<NaiveDate>,
    pub sexo: Option<String>,
    pub email: Option<String>,
    pub diagnostico_previo: Option<String>,
    pub painel_genetico: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FamiliaComMembros {
    pub id: i64,
    pub nome_familia: String,
    pub criador_id: i64,
    pub membros: Vec<Membro>,
}

/// `familia` is null for unaffiliated callers; that is a valid state,
/// not an error.
#[derive(Debug, Serialize, ToSchema)]
pub struct MinhaFamiliaResponse {
    pub familia: Option<FamiliaComMembros>,
}
