//! Support tickets and their append-only message lists.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use bazaar_types::models::{SupportTicket, TicketMessage, TicketStatus};

use crate::{Database, col_enum, col_ts, col_uuid};

const TICKET_COLUMNS: &str = "id, user_id, target_id, subject, status, created_at";

impl Database {
    pub fn insert_ticket(&self, ticket: &SupportTicket) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tickets (id, user_id, target_id, subject, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    ticket.id.to_string(),
                    ticket.user_id.to_string(),
                    ticket.target_id.to_string(),
                    ticket.subject,
                    ticket.status.as_str(),
                    ticket.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_ticket(&self, id: Uuid) -> Result<Option<SupportTicket>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1");
            let ticket = conn
                .query_row(&sql, [id.to_string()], row_to_ticket)
                .optional()?;

            match ticket {
                Some(mut ticket) => {
                    ticket.messages = ticket_messages(conn, ticket.id)?;
                    Ok(Some(ticket))
                }
                None => Ok(None),
            }
        })
    }

    /// The reuse lookup: an open ticket between this opener and target,
    /// if one exists.
    pub fn find_open_ticket(&self, user_id: Uuid, target_id: Uuid) -> Result<Option<SupportTicket>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE user_id = ?1 AND target_id = ?2 AND status = 'open'"
            );
            let ticket = conn
                .query_row(
                    &sql,
                    params![user_id.to_string(), target_id.to_string()],
                    row_to_ticket,
                )
                .optional()?;

            match ticket {
                Some(mut ticket) => {
                    ticket.messages = ticket_messages(conn, ticket.id)?;
                    Ok(Some(ticket))
                }
                None => Ok(None),
            }
        })
    }

    /// Tickets the user participates in, as opener or target.
    pub fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<SupportTicket>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE user_id = ?1 OR target_id = ?1
                 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut tickets = stmt
                .query_map([user_id.to_string()], row_to_ticket)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            for ticket in &mut tickets {
                ticket.messages = ticket_messages(conn, ticket.id)?;
            }
            Ok(tickets)
        })
    }

    pub fn append_ticket_message(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ticket_messages (ticket_id, user_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    ticket_id.to_string(),
                    user_id.to_string(),
                    content,
                    created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn set_ticket_status(&self, id: Uuid, status: TicketStatus) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tickets SET status = ?2 WHERE id = ?1",
                params![id.to_string(), status.as_str()],
            )?;
            Ok(())
        })
    }
}

fn row_to_ticket(row: &rusqlite::Row<'_>) -> rusqlite::Result<SupportTicket> {
    Ok(SupportTicket {
        id: col_uuid(row, 0)?,
        user_id: col_uuid(row, 1)?,
        target_id: col_uuid(row, 2)?,
        subject: row.get(3)?,
        status: col_enum(row, 4, TicketStatus::parse, "ticket status")?,
        messages: Vec::new(),
        created_at: col_ts(row, 5)?,
    })
}

fn ticket_messages(conn: &Connection, ticket_id: Uuid) -> Result<Vec<TicketMessage>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, content, created_at FROM ticket_messages
         WHERE ticket_id = ?1 ORDER BY created_at ASC",
    )?;
    let messages = stmt
        .query_map([ticket_id.to_string()], |row| {
            Ok(TicketMessage {
                user_id: col_uuid(row, 0)?,
                content: row.get(1)?,
                created_at: col_ts(row, 2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(messages)
}
