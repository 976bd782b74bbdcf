//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use super::{StoreError, Ticket, TicketStatus, TicketStore};

const SELECT_COLUMNS: &str = "SELECT id, title, description, status, created_at, updated_at FROM tickets";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        debug!("Opened ticket store at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'open'
                    CHECK (status IN ('open', 'stalled', 'closed')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_title ON tickets(title);
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            "#,
        )?;
        Ok(())
    }

    /// Acquire the connection for the duration of one operation.
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: String = row.get(0)?;
        let title: String = row.get(1)?;
        let description: Option<String> = row.get(2)?;
        let status: String = row.get(3)?;
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        let status = status
            .parse::<TicketStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(Ticket {
            id,
            title,
            description,
            status,
            created_at: parse_timestamp(4, &created_at)?,
            updated_at: parse_timestamp(5, &updated_at)?,
        })
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl TicketStore for SqliteTicketStore {
    fn get(&self, id: &Uuid) -> Result<Option<Ticket>, StoreError> {
        let conn = self.conn()?;
        let ticket = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id.to_string()],
                Self::row_to_ticket,
            )
            .optional()?;
        Ok(ticket)
    }

    fn find_by_title(&self, title: &str) -> Result<Option<Ticket>, StoreError> {
        let conn = self.conn()?;
        let ticket = conn
            .query_row(
                &format!("{} WHERE title = ? ORDER BY rowid LIMIT 1", SELECT_COLUMNS),
                params![title],
                Self::row_to_ticket,
            )
            .optional()?;
        Ok(ticket)
    }

    fn insert(&self, ticket: &Ticket, reject_duplicate_title: bool) -> Result<bool, StoreError> {
        let conn = self.conn()?;

        let sql = if reject_duplicate_title {
            "INSERT INTO tickets (id, title, description, status, created_at, updated_at) \
             SELECT ?1, ?2, ?3, ?4, ?5, ?6 \
             WHERE NOT EXISTS (SELECT 1 FROM tickets WHERE title = ?2)"
        } else {
            "INSERT INTO tickets (id, title, description, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        };

        let inserted = conn.execute(
            sql,
            params![
                ticket.id.to_string(),
                ticket.title,
                ticket.description,
                ticket.status.as_str(),
                format_timestamp(&ticket.created_at),
                format_timestamp(&ticket.updated_at),
            ],
        )?;

        Ok(inserted == 1)
    }

    fn update(&self, ticket: &Ticket, expected_status: TicketStatus) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE tickets SET title = ?, description = ?, status = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
            params![
                ticket.title,
                ticket.description,
                ticket.status.as_str(),
                format_timestamp(&ticket.updated_at),
                ticket.id.to_string(),
                expected_status.as_str(),
            ],
        )?;
        Ok(updated == 1)
    }

    fn transition_status(
        &self,
        id: &Uuid,
        from: TicketStatus,
        to: TicketStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE tickets SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
            params![
                to.as_str(),
                format_timestamp(&at),
                id.to_string(),
                from.as_str()
            ],
        )?;
        Ok(updated == 1)
    }

    fn delete(
        &self,
        id: &Uuid,
        required_status: Option<TicketStatus>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let deleted = match required_status {
            Some(status) => conn.execute(
                "DELETE FROM tickets WHERE id = ? AND status = ?",
                params![id.to_string(), status.as_str()],
            )?,
            None => conn.execute("DELETE FROM tickets WHERE id = ?", params![id.to_string()])?,
        };
        Ok(deleted == 1)
    }

    fn delete_all(&self, status: Option<TicketStatus>) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let deleted = match status {
            Some(status) => conn.execute(
                "DELETE FROM tickets WHERE status = ?",
                params![status.as_str()],
            )?,
            None => conn.execute("DELETE FROM tickets", [])?,
        };
        Ok(deleted as u64)
    }

    fn list(&self, skip: i64, limit: i64) -> Result<Vec<Ticket>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY rowid LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![limit, skip], Self::row_to_ticket)?;

        let mut tickets = Vec::new();
        for row_result in rows {
            tickets.push(row_result?);
        }
        Ok(tickets)
    }

    fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count)
    }
}
