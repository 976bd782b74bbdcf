//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::TicketError;

/// Minimum title length, in characters.
pub const TITLE_MIN_LEN: usize = 3;

/// Maximum title length, in characters.
pub const TITLE_MAX_LEN: usize = 100;

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 500;

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a ticket.
///
/// Only `Open` tickets can be closed. Deleting requires `Closed` unless the
/// caller forces it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    Stalled,
    Closed,
}

impl TicketStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Open,
        TicketStatus::Stalled,
        TicketStatus::Closed,
    ];

    /// Returns the status as its stored/serialized string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Stalled => "stalled",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that is not one of the known statuses.
#[derive(Debug, Error)]
#[error("unknown ticket status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for TicketStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "stalled" => Ok(TicketStatus::Stalled),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A persisted ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Build a fresh ticket with a new id, stamped at `now`.
    pub fn new(request: NewTicket, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            status: request.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`. Never moves it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}

/// Fields supplied when creating a ticket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
}

impl NewTicket {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check the title and description length constraints.
    pub fn validate(&self) -> Result<(), TicketError> {
        validate_title(&self.title)?;
        if let Some(ref description) = self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
}

impl TicketPatch {
    pub fn validate(&self) -> Result<(), TicketError> {
        if let Some(ref title) = self.title {
            validate_title(title)?;
        }
        if let Some(ref description) = self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Apply the present fields to `ticket` and refresh its `updated_at`.
    pub fn apply(self, ticket: &mut Ticket, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            ticket.title = title;
        }
        if let Some(description) = self.description {
            ticket.description = Some(description);
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
        ticket.touch(now);
    }
}

fn validate_title(title: &str) -> Result<(), TicketError> {
    let len = title.chars().count();
    if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len) {
        return Err(TicketError::Validation {
            field: "title",
            reason: format!(
                "must be between {} and {} characters, got {}",
                TITLE_MIN_LEN, TITLE_MAX_LEN, len
            ),
        });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), TicketError> {
    let len = description.chars().count();
    if len > DESCRIPTION_MAX_LEN {
        return Err(TicketError::Validation {
            field: "description",
            reason: format!(
                "must be at most {} characters, got {}",
                DESCRIPTION_MAX_LEN, len
            ),
        });
    }
    Ok(())
}
