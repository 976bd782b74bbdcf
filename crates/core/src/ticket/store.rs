//! Ticket storage trait.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{StoreError, Ticket, TicketStatus};

/// Trait for ticket storage backends.
///
/// Writes that carry a precondition (`reject_duplicate_title`, `from`,
/// `required_status`) must check it in the same statement as the write and
/// report `false` when it does not hold.
pub trait TicketStore: Send + Sync {
    /// Get a ticket by ID.
    fn get(&self, id: &Uuid) -> Result<Option<Ticket>, StoreError>;

    /// Get any ticket whose title matches exactly.
    fn find_by_title(&self, title: &str) -> Result<Option<Ticket>, StoreError>;

    /// Insert a new ticket.
    ///
    /// With `reject_duplicate_title`, nothing is written and `false` is
    /// returned when a ticket with the same title already exists.
    fn insert(&self, ticket: &Ticket, reject_duplicate_title: bool) -> Result<bool, StoreError>;

    /// Overwrite the mutable fields of an existing ticket, only if its stored
    /// status is still `expected_status`.
    /// Returns `false` if the ticket is gone or its status has changed.
    fn update(&self, ticket: &Ticket, expected_status: TicketStatus) -> Result<bool, StoreError>;

    /// Move a ticket from `from` to `to`, only if it is currently in `from`.
    fn transition_status(
        &self,
        id: &Uuid,
        from: TicketStatus,
        to: TicketStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Permanently delete a ticket, optionally only if it has `required_status`.
    fn delete(&self, id: &Uuid, required_status: Option<TicketStatus>)
        -> Result<bool, StoreError>;

    /// Delete every ticket with `status`, or every ticket when `None`.
    /// Returns the number of deleted rows.
    fn delete_all(&self, status: Option<TicketStatus>) -> Result<u64, StoreError>;

    /// Page through tickets in insertion order.
    fn list(&self, skip: i64, limit: i64) -> Result<Vec<Ticket>, StoreError>;

    /// Count all tickets.
    fn count(&self) -> Result<i64, StoreError>;
}
