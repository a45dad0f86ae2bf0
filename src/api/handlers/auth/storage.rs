//! Database helpers for the two identity kinds.
//!
//! Email is unique across the union of `paciente` and
//! `profissional_saude`; [`email_registered`] checks both tables in one
//! query so callers can report which kind collided.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::Instrument;

/// Which table an email collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentityKind {
    Paciente,
    Profissional,
}

/// A credential record of either kind.
pub(crate) enum Identity {
    Paciente(PacienteRecord),
    Profissional(ProfissionalRecord),
}

pub(crate) struct PacienteRecord {
    pub(crate) id_paciente: i64,
    pub(crate) nome: String,
    pub(crate) email: Option<String>,
    pub(crate) senha: String,
    pub(crate) sexo: Option<String>,
    pub(crate) data_nascimento: Option<NaiveDate>,
    pub(crate) diagnostico_previo: Option<String>,
    pub(crate) painel_genetico: Option<String>,
    pub(crate) id_familia: Option<i64>,
    pub(crate) nome_familia: Option<String>,
}

pub(crate) struct ProfissionalRecord {
    pub(crate) id_profissional: i64,
    pub(crate) nome: String,
    pub(crate) email: String,
    pub(crate) senha: String,
}

/// Check both identity tables for an email, reporting which kind holds it.
pub(crate) async fn email_registered(pool: &PgPool, email: &str) -> Result<Option<IdentityKind>> {
    let query = r"
        SELECT kind FROM (
            SELECT 'paciente' AS kind, 1 AS ord FROM paciente WHERE email = $1
            UNION ALL
            SELECT 'profissional' AS kind, 2 AS ord FROM profissional_saude WHERE email = $1
        ) AS matches
        ORDER BY ord
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check email uniqueness")?;

    Ok(row.map(|row| match row.get::<&str, _>("kind") {
        "paciente" => IdentityKind::Paciente,
        _ => IdentityKind::Profissional,
    }))
}

/// Look up a credential by email, paciente first. The lookup order is
/// unambiguous because an email can only exist in one table.
pub(crate) async fn find_identity_by_email(pool: &PgPool, email: &str) -> Result<Option<Identity>> {
    let query = r"
        SELECT p.id_paciente, p.nome, p.email, p.senha, p.sexo, p.data_nascimento,
               p.diagnostico_previo, p.painel_genetico, p.id_familia, f.nome_familia
        FROM paciente p
        LEFT JOIN familia f ON p.id_familia = f.id_familia
        WHERE p.email = $1
    ";
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to lookup paciente")?;

    if let Some(row) = row {
        return Ok(Some(Identity::Paciente(PacienteRecord {
            id_paciente: row.get("id_paciente"),
            nome: row.get("nome"),
            email: row.get("email"),
            senha: row.get("senha"),
            sexo: row.get("sexo"),
            data_nascimento: row.get("data_nascimento"),
            diagnostico_previo: row.get("diagnostico_previo"),
            painel_genetico: row.get("painel_genetico"),
            id_familia: row.get("id_familia"),
            nome_familia: row.get("nome_familia"),
        })));
    }

    let query = r"
        SELECT id_profissional, nome, email, senha
        FROM profissional_saude
        WHERE email = $1
    ";
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to lookup profissional")?;

    Ok(row.map(|row| {
        Identity::Profissional(ProfissionalRecord {
            id_profissional: row.get("id_profissional"),
            nome: row.get("nome"),
            email: row.get("email"),
            senha: row.get("senha"),
        })
    }))
}

/// Insert a fresh paciente row; clinical and family fields start null.
pub(crate) async fn insert_paciente(
    pool: &PgPool,
    nome: &str,
    email: &str,
    senha_hash: &str,
    sexo: &str,
    data_nascimento: NaiveDate,
) -> Result<i64, sqlx::Error> {
    let query = r"
        INSERT INTO paciente
            (nome, email, senha, sexo, data_nascimento, diagnostico_previo, painel_genetico, id_familia)
        VALUES ($1, $2, $3, $4, $5, NULL, NULL, NULL)
        RETURNING id_paciente
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(nome)
        .bind(email)
        .bind(senha_hash)
        .bind(sexo)
        .bind(data_nascimento)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(row.get("id_paciente"))
}

pub(crate) async fn insert_profissional(
    pool: &PgPool,
    nome: &str,
    email: &str,
    senha_hash: &str,
) -> Result<i64, sqlx::Error> {
    let query = r"
        INSERT INTO profissional_saude (nome, email, senha)
        VALUES ($1, $2, $3)
        RETURNING id_profissional
    ";
    let row = sqlx::query(query)
        .bind(nome)
        .bind(email)
        .bind(senha_hash)
        .fetch_one(pool)
        .await?;

    Ok(row.get("id_profissional"))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
