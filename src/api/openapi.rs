//! OpenAPI document for the REST surface.
//!
//! Served at `/openapi.json` and printed by the `openapi` binary.

use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "heredi",
        description = "Family genetic and health records",
    ),
    paths(
        handlers::health::health,
        handlers::auth::register::cadastro_paciente,
        handlers::auth::register::cadastro_profissional,
        handlers::auth::login::login,
        handlers::auth::verify::verificar,
        handlers::perfil::atualizar_perfil,
        handlers::familia::criar_familia,
        handlers::familia::adicionar_membro,
        handlers::familia::minha_familia,
        handlers::familia::sair_familia,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token verification"),
        (name = "perfil", description = "Clinical profile updates"),
        (name = "familia", description = "Family membership and roster"),
        (name = "health", description = "Service metadata"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

// axum handler serving the generated document
pub(crate) async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}
