//! SQL storage helpers for family membership.
//!
//! Create and add-member are the two multi-statement writes in the
//! service; both run inside a transaction so a família row is never
//! observable without its creator's membership and a partially-added
//! member is never observable at all. A transaction dropped on an error
//! path rolls back.

use axum::{http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::error;

use super::types::{FamiliaComMembros, FamiliaCriada, Membro, MembroAdicionado};
use crate::api::handlers::{auth::storage::is_unique_violation, error_response, internal_error};

#[derive(Debug)]
pub(super) enum FamiliaError {
    BadRequest(&'static str),
    Database(sqlx::Error),
}

impl From<sqlx::Error> for FamiliaError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl IntoResponse for FamiliaError {
    /// Database errors are logged server-side and surfaced as a generic
    /// `500` without leaking details.
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
            Self::Database(err) => {
                error!("Database error: {err}");
                internal_error()
            }
        }
    }
}

/// Member fields for [`add_membro`]; the caller hashes the credential.
pub(super) struct NewMembro<'a> {
    pub(super) nome: &'a str,
    pub(super) data_nascimento: Option<NaiveDate>,
    pub(super) sexo: Option<&'a str>,
    pub(super) email: Option<&'a str>,
    pub(super) senha_hash: &'a str,
}

/// Resolve the caller's current família, if any.
pub(super) async fn caller_family(
    pool: &PgPool,
    paciente_id: i64,
) -> Result<Option<i64>, FamiliaError> {
    let row = sqlx::query("SELECT id_familia FROM paciente WHERE id_paciente = $1")
        .bind(paciente_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|row| row.get("id_familia")))
}

/// Insert a família and move its creator into it, atomically.
///
/// A duplicate name maps to a conflict; any later failure rolls the
/// família insert back so no orphan row remains.
pub(super) async fn create_familia(
    pool: &PgPool,
    paciente_id: i64,
    nome_familia: &str,
) -> Result<FamiliaCriada, FamiliaError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r"
        INSERT INTO familia (nome_familia, criador_id_paciente)
        VALUES ($1, $2)
        RETURNING id_familia
        ",
    )
    .bind(nome_familia)
    .bind(paciente_id)
    .fetch_one(&mut *tx)
    .await;

    let familia_id: i64 = match inserted {
        Ok(row) => row.get("id_familia"),
        Err(err) if is_unique_violation(&err) => {
            let _ = tx.rollback().await;
            return Err(FamiliaError::BadRequest(
                "Já existe uma família com este nome",
            ));
        }
        Err(err) => return Err(err.into()),
    };

    sqlx::query("UPDATE paciente SET id_familia = $1 WHERE id_paciente = $2")
        .bind(familia_id)
        .bind(paciente_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(FamiliaCriada {
        id: familia_id,
        nome_familia: nome_familia.to_string(),
        criador_id: paciente_id,
    })
}

/// Attach a member to the caller's família, atomically.
///
/// Three sub-cases: an existing paciente identified by email is moved in
/// (idempotent when already a member, rejected when affiliated
/// elsewhere); an unknown email becomes a fresh pre-affiliated row; no
/// email becomes a roster-only row.
pub(super) async fn add_membro(
    pool: &PgPool,
    familia_id: i64,
    membro: NewMembro<'_>,
) -> Result<MembroAdicionado, FamiliaError> {
    let mut tx = pool.begin().await?;

    let paciente_id = if let Some(email) = membro.email {
        let existing = sqlx::query("SELECT id_paciente, id_familia FROM paciente WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(row) = existing {
            let existing_id: i64 = row.get("id_paciente");
            let existing_familia: Option<i64> = row.get("id_familia");

            if existing_familia.is_some_and(|current| current != familia_id) {
                let _ = tx.rollback().await;
                return Err(FamiliaError::BadRequest(
                    "Este usuário já pertence a outra família",
                ));
            }

            sqlx::query("UPDATE paciente SET id_familia = $1 WHERE id_paciente = $2")
                .bind(familia_id)
                .bind(existing_id)
                .execute(&mut *tx)
                .await?;

            existing_id
        } else {
            // Email must stay unique across both identity kinds; a
            // profissional may hold it even when no paciente does.
            let taken =
                sqlx::query("SELECT 1 AS found FROM profissional_saude WHERE email = $1")
                    .bind(email)
                    .fetch_optional(&mut *tx)
                    .await?;
            if taken.is_some() {
                let _ = tx.rollback().await;
                return Err(FamiliaError::BadRequest(
                    "Email já cadastrado como profissional",
                ));
            }

            insert_membro(&mut tx, familia_id, &membro, Some(email)).await?
        }
    } else {
        insert_membro(&mut tx, familia_id, &membro, None).await?
    };

    tx.commit().await?;

    Ok(MembroAdicionado {
        id: paciente_id,
        nome: membro.nome.to_string(),
        data_nascimento: membro.data_nascimento,
        sexo: membro.sexo.map(ToString::to_string),
        email: membro.email.map(ToString::to_string),
        id_familia: familia_id,
    })
}

async fn insert_membro(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    familia_id: i64,
    membro: &NewMembro<'_>,
    email: Option<&str>,
) -> Result<i64, FamiliaError> {
    let row = sqlx::query(
        r"
        INSERT INTO paciente (nome, data_nascimento, sexo, email, senha, id_familia)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id_paciente
        ",
    )
    .bind(membro.nome)
    .bind(membro.data_nascimento)
    .bind(membro.sexo)
    .bind(email)
    .bind(membro.senha_hash)
    .bind(familia_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.get("id_paciente"))
}

/// Fetch the caller's família and full roster, or `None` when
/// unaffiliated.
pub(super) async fn fetch_minha_familia(
    pool: &PgPool,
    paciente_id: i64,
) -> Result<Option<FamiliaComMembros>, FamiliaError> {
    let row = sqlx::query(
        r"
        SELECT p.id_familia, f.nome_familia, f.criador_id_paciente
        FROM paciente p
        LEFT JOIN familia f ON p.id_familia = f.id_familia
        WHERE p.id_paciente = $1
        ",
    )
    .bind(paciente_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let Some(familia_id) = row.get::<Option<i64>, _>("id_familia") else {
        return Ok(None);
    };

    let nome_familia: String = row.get("nome_familia");
    let criador_id: i64 = row.get("criador_id_paciente");

    let membros = sqlx::query(
        r"
        SELECT id_paciente, nome, data_nascimento, sexo, email,
               diagnostico_previo, painel_genetico
        FROM paciente
        WHERE id_familia = $1
        ORDER BY id_paciente
        ",
    )
    .bind(familia_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| Membro {
        id_paciente: row.get("id_paciente"),
        nome: row.get("nome"),
        data_nascimento: row.get("data_nascimento"),
        sexo: row.get("sexo"),
        email: row.get("email"),
        diagnostico_previo: row.get("diagnostico_previo"),
        painel_genetico: row.get("painel_genetico"),
    })
    .collect();

    Ok(Some(FamiliaComMembros {
        id: familia_id,
        nome_familia,
        criador_id,
        membros,
    }))
}

/// Detach the caller from their família. A no-op when already
/// unaffiliated; the família row stays even if it becomes memberless.
pub(super) async fn leave_familia(pool: &PgPool, paciente_id: i64) -> Result<(), FamiliaError> {
    sqlx::query("UPDATE paciente SET id_familia = NULL WHERE id_paciente = $1")
        .bind(paciente_id)
        .execute(pool)
        .await?;

    Ok(())
}
