//! Ticket system: entity, persistence port and lifecycle service.

mod error;
mod service;
mod sqlite_store;
mod store;
mod types;

pub use error::{StoreError, TicketError};
pub use service::{DeleteSummary, TicketPage, TicketService};
pub use sqlite_store::SqliteTicketStore;
pub use store::TicketStore;
pub use types::{
    NewTicket, ParseStatusError, Ticket, TicketPatch, TicketStatus, DESCRIPTION_MAX_LEN,
    TITLE_MAX_LEN, TITLE_MIN_LEN,
};
