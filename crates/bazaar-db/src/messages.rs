//! Direct messages and the per-channel broadcast log.

use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use bazaar_types::models::{ChatMessage, Message, MessageKind};

use crate::{Database, col_enum, col_ts, col_uuid};

impl Database {
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, from_id, to_id, content, kind, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    message.id.to_string(),
                    message.from_id.to_string(),
                    message.to_id.to_string(),
                    message.content,
                    message.kind.as_str(),
                    message.read,
                    message.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Messages addressed to the user, newest first.
    pub fn inbox(&self, user_id: Uuid) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, from_id, to_id, content, kind, read, created_at
                 FROM messages WHERE to_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let messages = stmt
                .query_map([user_id.to_string()], row_to_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(messages)
        })
    }

    /// Idempotent: marking an already-read message changes nothing.
    /// Returns false when no such message exists.
    pub fn mark_read(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE messages SET read = 1 WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(affected > 0)
        })
    }

    /// Derived on read; never stored.
    pub fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE to_id = ?1 AND read = 0",
                [user_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // -- Channel chat --

    pub fn insert_chat_message(&self, message: &ChatMessage) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, user_id, content, channel, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id.to_string(),
                    message.user_id.to_string(),
                    message.content,
                    message.channel,
                    message.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// The channel's full append-only log, oldest first.
    pub fn channel_log(&self, channel: &str) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, content, channel, created_at
                 FROM chat_messages WHERE channel = ?1
                 ORDER BY created_at ASC",
            )?;
            let messages = stmt
                .query_map([channel], |row| {
                    Ok(ChatMessage {
                        id: col_uuid(row, 0)?,
                        user_id: col_uuid(row, 1)?,
                        content: row.get(2)?,
                        channel: row.get(3)?,
                        created_at: col_ts(row, 4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(messages)
        })
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: col_uuid(row, 0)?,
        from_id: col_uuid(row, 1)?,
        to_id: col_uuid(row, 2)?,
        content: row.get(3)?,
        kind: col_enum(row, 4, MessageKind::parse, "message kind")?,
        read: row.get(5)?,
        created_at: col_ts(row, 6)?,
    })
}
