use crate::{cli::globals::GlobalArgs, token};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{delete, get, post, put},
    Extension, Router,
};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub(crate) mod handlers;
// OpenAPI document assembly lives in openapi.rs.
mod openapi;

pub use self::openapi::openapi;

use self::handlers::{auth, familia, health, perfil};

/// Build the application router with middleware and shared state.
#[must_use]
pub fn app(pool: PgPool, keys: Arc<token::Keys>) -> Router {
    // The frontend is a separate origin; tokens travel in headers, not
    // cookies, so credentials stay off and any origin is acceptable.
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi::serve))
        .route("/auth/paciente/cadastro", post(auth::register::cadastro_paciente))
        .route(
            "/auth/profissional/cadastro",
            post(auth::register::cadastro_profissional),
        )
        .route("/auth/login", post(auth::login::login))
        .route("/auth/verificar", get(auth::verify::verificar))
        .route("/perfil", put(perfil::atualizar_perfil))
        .route("/familia", post(familia::criar_familia))
        .route("/familia/membros", post(familia::adicionar_membro))
        .route("/minha-familia", get(familia::minha_familia))
        .route("/familia/sair", delete(familia::sair_familia))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(keys))
                .layer(Extension(pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the database or start the server
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let keys = Arc::new(token::Keys::new(
        globals.token_secret.expose_secret().as_bytes(),
    ));

    let app = app(pool, keys);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
