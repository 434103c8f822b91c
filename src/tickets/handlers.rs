use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use crate::state::AppState;

use super::{
    error::TicketError,
    extractors::{TicketBody, TicketId},
    repo_types::Ticket,
    services::TicketService,
    validation::{validate_create, validate_update},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(find_all))
        .route("/tickets/:id", get(find_one))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(create))
        .route("/tickets/:id", patch(update).delete(remove))
        .route("/tickets/:id/mark-used", patch(mark_as_used))
}

/// Create a new ticket
#[utoipa::path(
    post,
    path = "/api/tickets",
    tag = "tickets",
    request_body = crate::tickets::dto::NewTicket,
    responses(
        (status = 201, description = "The ticket has been successfully created.", body = Ticket,
            headers(("Location" = String, description = "URL to the created ticket"))),
        (status = 400, description = "Invalid input data.", body = crate::tickets::dto::ErrorBody),
    )
)]
#[instrument(skip(service, body))]
pub async fn create(
    State(service): State<TicketService>,
    TicketBody(body): TicketBody,
) -> Result<impl IntoResponse, TicketError> {
    let input = validate_create(&body).map_err(TicketError::Validation)?;
    let ticket = service.create(input).await?;
    let location = format!("/api/tickets/{}", ticket.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(ticket)))
}

/// Get all tickets
#[utoipa::path(
    get,
    path = "/api/tickets",
    tag = "tickets",
    responses(
        (status = 200, description = "Successfully retrieved all tickets.", body = [Ticket]),
    )
)]
#[instrument(skip(service))]
pub async fn find_all(
    State(service): State<TicketService>,
) -> Result<Json<Vec<Ticket>>, TicketError> {
    Ok(Json(service.find_all().await?))
}

/// Get a ticket by ID
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    tag = "tickets",
    params(("id" = uuid::Uuid, Path, description = "UUID of the ticket to retrieve")),
    responses(
        (status = 200, description = "Successfully retrieved the ticket.", body = Ticket),
        (status = 400, description = "Malformed ticket id.", body = crate::tickets::dto::ErrorBody),
        (status = 404, description = "Ticket not found.", body = crate::tickets::dto::ErrorBody),
    )
)]
#[instrument(skip(service, id), fields(ticket_id = %id.0))]
pub async fn find_one(
    State(service): State<TicketService>,
    id: TicketId,
) -> Result<Json<Ticket>, TicketError> {
    Ok(Json(service.find_one(id.0).await?))
}

/// Update a ticket
#[utoipa::path(
    patch,
    path = "/api/tickets/{id}",
    tag = "tickets",
    params(("id" = uuid::Uuid, Path, description = "UUID of the ticket to update")),
    request_body = crate::tickets::dto::TicketPatch,
    responses(
        (status = 200, description = "The ticket has been successfully updated.", body = Ticket),
        (status = 400, description = "Invalid input data.", body = crate::tickets::dto::ErrorBody),
        (status = 404, description = "Ticket not found.", body = crate::tickets::dto::ErrorBody),
    )
)]
#[instrument(skip(service, id, body), fields(ticket_id = %id.0))]
pub async fn update(
    State(service): State<TicketService>,
    id: TicketId,
    TicketBody(body): TicketBody,
) -> Result<Json<Ticket>, TicketError> {
    let patch = validate_update(&body).map_err(TicketError::Validation)?;
    Ok(Json(service.update(id.0, patch).await?))
}

/// Mark a ticket as used. This cannot be undone.
#[utoipa::path(
    patch,
    path = "/api/tickets/{id}/mark-used",
    tag = "tickets",
    params(("id" = uuid::Uuid, Path, description = "UUID of the ticket to mark as used")),
    responses(
        (status = 200, description = "The ticket has been successfully marked as used.", body = Ticket),
        (status = 400, description = "Malformed ticket id.", body = crate::tickets::dto::ErrorBody),
        (status = 404, description = "Ticket not found.", body = crate::tickets::dto::ErrorBody),
    )
)]
#[instrument(skip(service, id), fields(ticket_id = %id.0))]
pub async fn mark_as_used(
    State(service): State<TicketService>,
    id: TicketId,
) -> Result<Json<Ticket>, TicketError> {
    Ok(Json(service.mark_as_used(id.0).await?))
}

/// Delete a ticket permanently
#[utoipa::path(
    delete,
    path = "/api/tickets/{id}",
    tag = "tickets",
    params(("id" = uuid::Uuid, Path, description = "UUID of the ticket to delete")),
    responses(
        (status = 200, description = "The ticket has been successfully deleted."),
        (status = 400, description = "Malformed ticket id.", body = crate::tickets::dto::ErrorBody),
        (status = 404, description = "Ticket not found.", body = crate::tickets::dto::ErrorBody),
    )
)]
#[instrument(skip(service, id), fields(ticket_id = %id.0))]
pub async fn remove(
    State(service): State<TicketService>,
    id: TicketId,
) -> Result<StatusCode, TicketError> {
    service.remove(id.0).await?;
    Ok(StatusCode::OK)
}
