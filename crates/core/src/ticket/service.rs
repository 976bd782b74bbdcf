//! Ticket lifecycle operations on top of a [`TicketStore`].

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{NewTicket, Ticket, TicketError, TicketPatch, TicketStatus, TicketStore};

/// One page of tickets plus the unfiltered total.
#[derive(Debug, Clone)]
pub struct TicketPage {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub results: Vec<Ticket>,
}

/// Outcome of a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// Tickets removed by this call.
    pub deleted: u64,
    /// Tickets left in the store afterwards.
    pub remaining: i64,
}

/// Ticket service.
///
/// Status gates are enforced twice: once against the record just read (to
/// pick the right error) and once by the store's conditional write. If the
/// conditional write misses, the record changed in between and the rules
/// are re-applied to the fresh state.
pub struct TicketService {
    store: Arc<dyn TicketStore>,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Create a ticket, optionally refusing titles that already exist.
    pub fn create(
        &self,
        request: NewTicket,
        reject_duplicates: bool,
    ) -> Result<Ticket, TicketError> {
        request.validate()?;

        if reject_duplicates && self.store.find_by_title(&request.title)?.is_some() {
            return Err(TicketError::DuplicateTitle(request.title));
        }

        let ticket = Ticket::new(request, now());
        if !self.store.insert(&ticket, reject_duplicates)? {
            return Err(TicketError::DuplicateTitle(ticket.title));
        }

        // Read back so the caller sees what the store actually holds
        self.store.get(&ticket.id)?.ok_or_else(|| {
            TicketError::Unexpected(format!("ticket {} missing after insert", ticket.id))
        })
    }

    /// List a page of tickets. `skip` and `limit` are assumed already bounded.
    pub fn list(&self, skip: i64, limit: i64) -> Result<TicketPage, TicketError> {
        let total = self.store.count()?;
        let results = self.store.list(skip, limit)?;
        Ok(TicketPage {
            total,
            skip,
            limit,
            results,
        })
    }

    /// Number of stored tickets.
    pub fn count(&self) -> Result<i64, TicketError> {
        Ok(self.store.count()?)
    }

    pub fn get(&self, id: &str) -> Result<Ticket, TicketError> {
        let id = parse_id(id)?;
        self.require(&id)
    }

    /// Apply a partial update. An empty patch still refreshes `updated_at`.
    ///
    /// The write only lands if the status is still the one the patch was
    /// applied to, so fields absent from the patch never overwrite a
    /// concurrent close.
    pub fn update(&self, id: &str, patch: TicketPatch) -> Result<Ticket, TicketError> {
        let id = parse_id(id)?;
        patch.validate()?;

        loop {
            let mut ticket = self.require(&id)?;
            let read_status = ticket.status;
            patch.clone().apply(&mut ticket, now());

            if self.store.update(&ticket, read_status)? {
                return Ok(ticket);
            }
        }
    }

    /// Close an open ticket.
    pub fn close(&self, id: &str) -> Result<Ticket, TicketError> {
        let id = parse_id(id)?;

        loop {
            let mut ticket = self.require(&id)?;
            match ticket.status {
                TicketStatus::Open => {}
                TicketStatus::Stalled => {
                    return Err(TicketError::InvalidTransition(
                        "Cannot close a stalled ticket".to_string(),
                    ));
                }
                TicketStatus::Closed => return Err(TicketError::AlreadyClosed(id.to_string())),
            }

            ticket.touch(now());
            if self.store.transition_status(
                &id,
                TicketStatus::Open,
                TicketStatus::Closed,
                ticket.updated_at,
            )? {
                ticket.status = TicketStatus::Closed;
                return Ok(ticket);
            }
        }
    }

    /// Delete a closed ticket, or any ticket when `force_delete` is set.
    pub fn delete(&self, id: &str, force_delete: bool) -> Result<(), TicketError> {
        let id = parse_id(id)?;

        loop {
            let ticket = self.require(&id)?;
            let required_status = if force_delete {
                None
            } else {
                if ticket.status != TicketStatus::Closed {
                    return Err(TicketError::InvalidTransition(format!(
                        "Cannot delete a {} ticket without force_delete",
                        ticket.status
                    )));
                }
                Some(TicketStatus::Closed)
            };

            if self.store.delete(&id, required_status)? {
                return Ok(());
            }
        }
    }

    /// Delete every closed ticket, or every ticket when `force_delete` is set.
    pub fn delete_all(&self, force_delete: bool) -> Result<DeleteSummary, TicketError> {
        let status = if force_delete {
            None
        } else {
            Some(TicketStatus::Closed)
        };

        let deleted = self.store.delete_all(status)?;
        let remaining = self.store.count()?;
        Ok(DeleteSummary { deleted, remaining })
    }

    fn require(&self, id: &Uuid) -> Result<Ticket, TicketError> {
        self.store
            .get(id)?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))
    }
}

/// Current time at the precision the store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn parse_id(id: &str) -> Result<Uuid, TicketError> {
    Uuid::parse_str(id).map_err(|_| TicketError::InvalidIdentifier(id.to_string()))
}
