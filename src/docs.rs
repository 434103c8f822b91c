use axum::{routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::state::AppState;
use crate::tickets::{dto, handlers, repo_types};

pub const OPENAPI_PATH: &str = "/docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ticket API",
        version = "1.0",
        description = "API for managing event tickets"
    ),
    paths(
        handlers::create,
        handlers::find_all,
        handlers::find_one,
        handlers::update,
        handlers::mark_as_used,
        handlers::remove,
    ),
    components(schemas(
        repo_types::Ticket,
        dto::NewTicket,
        dto::TicketPatch,
        dto::ErrorBody,
        dto::FieldViolation,
    )),
    modifiers(&BearerAuth),
    tags((name = "tickets", description = "Event ticket management"))
)]
pub struct ApiDoc;

/// Advertises a bearer scheme in the document; requests are not authenticated.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "JWT-auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Enter JWT token"))
                    .build(),
            ),
        );
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
