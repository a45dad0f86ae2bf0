//! End-to-end tests against a real Postgres database.
//!
//! Set `HEREDI_TEST_DSN` to a database this suite may own (tables are
//! dropped and recreated); the suite is skipped when the variable is
//! absent, so `cargo test` stays green without infrastructure.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use heredi::{api, token::Keys};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use tower::ServiceExt;

const SCHEMA_SQL: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/db/sql/01_heredi.sql"
));

const TEST_SECRET: &[u8] = b"test-secret";

async fn test_app() -> Option<(Router, PgPool)> {
    let Ok(dsn) = std::env::var("HEREDI_TEST_DSN") else {
        eprintln!("Skipping integration test: HEREDI_TEST_DSN not set");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .expect("failed to connect test database");

    apply_schema(&pool).await;

    let app = api::app(pool.clone(), Arc::new(Keys::new(TEST_SECRET)));
    Some((app, pool))
}

async fn apply_schema(pool: &PgPool) {
    sqlx::query("DROP TABLE IF EXISTS paciente, profissional_saude, familia CASCADE")
        .execute(pool)
        .await
        .expect("failed to drop tables");

    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .unwrap_or_else(|err| panic!("schema statement {} failed: {err}", index + 1));
    }
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };

    (status, value)
}

#[tokio::test]
async fn familia_end_to_end() {
    let Some((app, _pool)) = test_app().await else {
        return;
    };

    // Register a paciente; the token claims must decode to the stored
    // role and id.
    let (status, ana) = request(
        &app,
        "POST",
        "/auth/paciente/cadastro",
        None,
        Some(json!({
            "nome": "Ana Silva",
            "email": "ana@example.com",
            "senha": "Abcdef1!",
            "sexo": "F",
            "data_nascimento": "1990-06-15",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{ana}");
    let ana_token = ana["token"].as_str().expect("token").to_string();
    let ana_id = ana["user"]["id"].as_i64().expect("id");
    assert_eq!(ana["user"]["tipo"], "paciente");
    assert!(ana["user"].get("senha").is_none());

    let (status, verified) =
        request(&app, "GET", "/auth/verificar", Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["user"]["id"].as_i64(), Some(ana_id));
    assert_eq!(verified["user"]["tipo"], "paciente");

    // Same email again, either kind, always conflicts.
    let (status, body) = request(
        &app,
        "POST",
        "/auth/paciente/cadastro",
        None,
        Some(json!({
            "nome": "Ana Clone",
            "email": "ana@example.com",
            "senha": "Abcdef1!",
            "sexo": "F",
            "data_nascimento": "1991-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email já cadastrado como paciente");

    let (status, body) = request(
        &app,
        "POST",
        "/auth/profissional/cadastro",
        None,
        Some(json!({
            "nome": "Ana Clone",
            "email": "ana@example.com",
            "senha": "Abcdef1!",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email já cadastrado como paciente");

    // And the other order: a profissional's email blocks paciente signup.
    let (status, _) = request(
        &app,
        "POST",
        "/auth/profissional/cadastro",
        None,
        Some(json!({
            "nome": "Dra. Lia",
            "email": "lia@example.com",
            "senha": "Abcdef1!",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        &app,
        "POST",
        "/auth/paciente/cadastro",
        None,
        Some(json!({
            "nome": "Lia Paciente",
            "email": "lia@example.com",
            "senha": "Abcdef1!",
            "sexo": "F",
            "data_nascimento": "1980-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email já cadastrado como profissional");

    // Wrong password and unknown email produce the identical error.
    let (status, wrong_password) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "ana@example.com", "senha": "Wrong12!"})),
    )
    .await;
    let (status2, unknown_email) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "senha": "Abcdef1!"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(status2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["error"], "Credenciais inválidas");

    // Create a família; a second create from the same caller is rejected.
    let (status, created) = request(
        &app,
        "POST",
        "/familia",
        Some(&ana_token),
        Some(json!({"nome_familia": "Silva"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["familia"]["nome_familia"], "Silva");
    assert_eq!(created["familia"]["criador_id"].as_i64(), Some(ana_id));

    let (status, body) = request(
        &app,
        "POST",
        "/familia",
        Some(&ana_token),
        Some(json!({"nome_familia": "Silva Segunda"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Você já pertence a uma família");

    // A second paciente with their own família.
    let (_, bia) = request(
        &app,
        "POST",
        "/auth/paciente/cadastro",
        None,
        Some(json!({
            "nome": "Bia Souza",
            "email": "bia@example.com",
            "senha": "Abcdef1!",
            "sexo": "F",
            "data_nascimento": "1985-03-03",
        })),
    )
    .await;
    let bia_token = bia["token"].as_str().expect("token").to_string();

    let (status, _) = request(
        &app,
        "POST",
        "/familia",
        Some(&bia_token),
        Some(json!({"nome_familia": "Souza"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate família name.
    let (_, cid) = request(
        &app,
        "POST",
        "/auth/paciente/cadastro",
        None,
        Some(json!({
            "nome": "Cid",
            "email": "cid@example.com",
            "senha": "Abcdef1!",
            "sexo": "M",
            "data_nascimento": "1970-01-01",
        })),
    )
    .await;
    let cid_token = cid["token"].as_str().expect("token").to_string();
    let (status, body) = request(
        &app,
        "POST",
        "/familia",
        Some(&cid_token),
        Some(json!({"nome_familia": "Silva"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Já existe uma família com este nome");

    // Cross-família member add is rejected and leaves the roster alone.
    let (status, body) = request(
        &app,
        "POST",
        "/familia/membros",
        Some(&ana_token),
        Some(json!({"nome": "Bia Souza", "email": "bia@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Este usuário já pertence a outra família");

    let (_, souza) = request(&app, "GET", "/minha-familia", Some(&bia_token), None).await;
    assert_eq!(souza["familia"]["membros"].as_array().expect("membros").len(), 1);

    // Add a fresh member by new email, and a roster-only member with none.
    let (status, carlos) = request(
        &app,
        "POST",
        "/familia/membros",
        Some(&ana_token),
        Some(json!({
            "nome": "Carlos Silva",
            "email": "carlos@example.com",
            "sexo": "M",
            "data_nascimento": "2010-02-02",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{carlos}");
    assert_eq!(carlos["membro"]["idFamilia"], created["familia"]["id"]);

    let (status, _) = request(
        &app,
        "POST",
        "/familia/membros",
        Some(&ana_token),
        Some(json!({"nome": "Avó Silva", "sexo": "F"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // A member created by add cannot authenticate with any password.
    for senha in ["Abcdef1!", "Qualquer9?"] {
        let (status, body) = request(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "carlos@example.com", "senha": senha})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Credenciais inválidas");
    }

    // Roster lists creator and members, oldest id first.
    let (status, roster) = request(&app, "GET", "/minha-familia", Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let membros = roster["familia"]["membros"].as_array().expect("membros");
    assert_eq!(membros.len(), 3);
    assert_eq!(membros[0]["nome"], "Ana Silva");
    assert_eq!(membros[1]["nome"], "Carlos Silva");
    assert_eq!(membros[2]["nome"], "Avó Silva");
    assert!(membros.iter().all(|membro| membro.get("senha").is_none()));

    // Profile update is visible on the next login.
    let (status, _) = request(
        &app,
        "PUT",
        "/perfil",
        Some(&ana_token),
        Some(json!({
            "diagnostico_previo": "Cardiomiopatia",
            "painel_genetico": "Painel cardio 2024",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, relogin) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "ana@example.com", "senha": "Abcdef1!"})),
    )
    .await;
    assert_eq!(relogin["user"]["diagnostico_previo"], "Cardiomiopatia");
    assert_eq!(relogin["user"]["nome_familia"], "Silva");

    // Leaving detaches only the caller; the rest of the roster stays.
    let (status, body) = request(&app, "DELETE", "/familia/sair", Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Você saiu da família com sucesso");

    let (_, after_leave) = request(&app, "GET", "/minha-familia", Some(&ana_token), None).await;
    assert_eq!(after_leave["familia"], Value::Null);

    // Leaving again is a harmless no-op.
    let (status, _) = request(&app, "DELETE", "/familia/sair", Some(&ana_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, souza) = request(&app, "GET", "/minha-familia", Some(&bia_token), None).await;
    assert_eq!(souza["familia"]["nome_familia"], "Souza");
    assert_eq!(souza["familia"]["membros"].as_array().expect("membros").len(), 1);
}
