use anyhow::{Result, anyhow};
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::MessageRow;

const MESSAGE_SELECT: &str = "
    SELECT m.id, m.chat_id, m.sender_id, u.name, m.content, m.is_read, m.created_at
    FROM messages m
    LEFT JOIN users u ON u.id = m.sender_id";

impl Database {
    /// Appends a message with a server-assigned timestamp and bumps the
    /// chat's `updated_at` in the same transaction.
    pub fn insert_message(
        &self,
        id: &str,
        chat_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        let now = crate::timestamp_now();
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO messages (id, chat_id, sender_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, chat_id, sender_id, content, now],
            )?;
            tx.execute("UPDATE chats SET updated_at = ?1 WHERE id = ?2", (&now, chat_id))?;

            let row = tx
                .query_row(&format!("{MESSAGE_SELECT} WHERE m.id = ?1"), [id], map_message)
                .optional()?
                .ok_or_else(|| anyhow!("message {} missing after insert", id))?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// Messages of a chat in ascending time order. With `after`, only those
    /// strictly newer than that stored-format timestamp.
    pub fn get_messages(&self, chat_id: &str, after: Option<&str>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE m.chat_id = ?1 AND (?2 IS NULL OR m.created_at > ?2)
                 ORDER BY m.created_at ASC, m.rowid ASC"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![chat_id, after], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Flags every unread message in the chat not sent by `reader_id` as read.
    /// Returns how many rows changed.
    pub fn mark_messages_read(&self, chat_id: &str, reader_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE chat_id = ?1 AND sender_id != ?2 AND is_read = 0",
                [chat_id, reader_id],
            )?;
            Ok(changed)
        })
    }
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get::<_, Option<String>>(3)?.unwrap_or_else(|| "unknown".to_string()),
        content: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}
