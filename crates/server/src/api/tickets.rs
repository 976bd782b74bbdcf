//! Ticket API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketdesk_core::{
    DeleteSummary, NewTicket, Ticket, TicketError, TicketPage, TicketPatch, TicketStatus,
};
use tracing::{debug, error, info};

use crate::metrics::{
    TICKETS_CLOSED_TOTAL, TICKETS_CREATED_TOTAL, TICKETS_DELETED_TOTAL, TICKET_ERRORS_TOTAL,
};
use crate::state::AppState;

/// Maximum allowed limit for ticket listing
const MAX_LIMIT: i64 = 100;

/// Default limit for ticket listing
const DEFAULT_LIMIT: i64 = 10;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for creating a ticket
#[derive(Debug, Default, Deserialize)]
pub struct CreateTicketParams {
    /// Refuse to create a ticket whose title already exists
    #[serde(default)]
    pub reject_duplicates: bool,
}

/// Query parameters for listing tickets
#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsParams {
    /// Number of tickets to skip
    pub skip: Option<i64>,
    /// Maximum number of tickets to return
    pub limit: Option<i64>,
}

/// Query parameters for deleting tickets
#[derive(Debug, Default, Deserialize)]
pub struct DeleteTicketParams {
    /// Delete regardless of status
    #[serde(default)]
    pub force_delete: bool,
}

/// Response for ticket operations
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            title: ticket.title,
            description: ticket.description,
            status: ticket.status,
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub results: Vec<TicketResponse>,
}

impl From<TicketPage> for ListTicketsResponse {
    fn from(page: TicketPage) -> Self {
        Self {
            total: page.total,
            skip: page.skip,
            limit: page.limit,
            results: page.results.into_iter().map(TicketResponse::from).collect(),
        }
    }
}

/// Response for bulk deletion
#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    pub message: String,
    pub deleted: u64,
    pub remaining: i64,
}

impl From<DeleteSummary> for DeleteAllResponse {
    fn from(summary: DeleteSummary) -> Self {
        let message = if summary.deleted == 0 {
            format!(
                "No tickets were deleted. {} remaining tickets.",
                summary.remaining
            )
        } else {
            format!(
                "{} tickets deleted. {} remaining tickets.",
                summary.deleted, summary.remaining
            )
        };
        Self {
            message,
            deleted: summary.deleted,
            remaining: summary.remaining,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<TicketErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(TicketErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a service error to its HTTP status and body.
fn ticket_error(err: TicketError) -> ApiError {
    let (status, kind) = match &err {
        TicketError::DuplicateTitle(_) => (StatusCode::BAD_REQUEST, "duplicate_title"),
        TicketError::InvalidTransition(_) => (StatusCode::BAD_REQUEST, "invalid_transition"),
        TicketError::AlreadyClosed(_) => (StatusCode::BAD_REQUEST, "already_closed"),
        TicketError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        TicketError::InvalidIdentifier(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_identifier")
        }
        TicketError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        TicketError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "unexpected"),
    };

    TICKET_ERRORS_TOTAL.with_label_values(&[kind]).inc();

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Ticket operation failed: {}", err);
    } else {
        debug!("Ticket operation rejected ({}): {}", kind, err);
    }

    api_error(status, err.to_string())
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| api_error(rejection.status(), rejection.body_text()))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| api_error(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CreateTicketParams>, QueryRejection>,
    body: Result<Json<NewTicket>, JsonRejection>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let params = query_params(params)?;
    let request = json_body(body)?;

    let ticket = state
        .tickets()
        .create(request, params.reject_duplicates)
        .map_err(ticket_error)?;

    TICKETS_CREATED_TOTAL.inc();
    info!("Created ticket {} ({})", ticket.id, ticket.status);

    Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket))))
}

/// List tickets with pagination
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListTicketsParams>, QueryRejection>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let params = query_params(params)?;

    let skip = params.skip.unwrap_or(0);
    if skip < 0 {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "skip must be greater than or equal to 0",
        ));
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(0..=MAX_LIMIT).contains(&limit) {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("limit must be between 0 and {}", MAX_LIMIT),
        ));
    }

    let page = state.tickets().list(skip, limit).map_err(ticket_error)?;
    Ok(Json(ListTicketsResponse::from(page)))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.tickets().get(&id).map_err(ticket_error)?;
    Ok(Json(TicketResponse::from(ticket)))
}

/// Partially update a ticket
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<TicketPatch>, JsonRejection>,
) -> Result<Json<TicketResponse>, ApiError> {
    let patch = json_body(body)?;
    let ticket = state.tickets().update(&id, patch).map_err(ticket_error)?;
    Ok(Json(TicketResponse::from(ticket)))
}

/// Close an open ticket
pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.tickets().close(&id).map_err(ticket_error)?;

    TICKETS_CLOSED_TOTAL.inc();
    info!("Closed ticket {}", ticket.id);

    Ok(Json(TicketResponse::from(ticket)))
}

/// Delete a single ticket
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<DeleteTicketParams>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let params = query_params(params)?;
    state
        .tickets()
        .delete(&id, params.force_delete)
        .map_err(ticket_error)?;

    TICKETS_DELETED_TOTAL.with_label_values(&["single"]).inc();
    info!(
        "Deleted ticket {} (force_delete: {})",
        id, params.force_delete
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Delete all closed tickets, or all tickets with `force_delete`
pub async fn delete_all_tickets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DeleteTicketParams>, QueryRejection>,
) -> Result<Json<DeleteAllResponse>, ApiError> {
    let params = query_params(params)?;
    let summary = state
        .tickets()
        .delete_all(params.force_delete)
        .map_err(ticket_error)?;

    TICKETS_DELETED_TOTAL
        .with_label_values(&["bulk"])
        .inc_by(summary.deleted);
    info!(
        "Bulk delete removed {} tickets, {} remaining (force_delete: {})",
        summary.deleted, summary.remaining, params.force_delete
    );

    Ok(Json(DeleteAllResponse::from(summary)))
}
