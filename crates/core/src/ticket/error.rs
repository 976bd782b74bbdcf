//! Error types for the ticket system.

use thiserror::Error;

/// Failure raised by a [`TicketStore`](super::TicketStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be mapped back into a ticket.
    #[error("Corrupt ticket record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::FromSqlConversionFailure(_, _, source) => {
                StoreError::Corrupt(source.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Errors surfaced by [`TicketService`](super::TicketService) operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// A ticket with the same title exists and duplicates were rejected.
    #[error("A ticket with the title: {0}, already exists.")]
    DuplicateTitle(String),

    /// No ticket with the given id.
    #[error("Ticket with ID {0} is not found.")]
    NotFound(String),

    /// The id is not a valid UUID.
    #[error("Invalid ticket ID: {0}")]
    InvalidIdentifier(String),

    /// The requested status change is not allowed from the current status.
    #[error("{0}")]
    InvalidTransition(String),

    /// Close was requested on a ticket that is already closed.
    #[error("Ticket with ID {0} is already closed.")]
    AlreadyClosed(String),

    /// A field violates its length constraint.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Any other failure, typically the store being unavailable.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<StoreError> for TicketError {
    fn from(e: StoreError) -> Self {
        TicketError::Unexpected(e.to_string())
    }
}
