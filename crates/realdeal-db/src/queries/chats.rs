use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};

use super::{OptionalExt, decode_images};
use crate::Database;
use crate::models::{ChatRow, ChatSummaryRow};

const CHAT_SELECT: &str = "
    SELECT ch.id, ch.listing_id, l.title, l.images, l.price,
           ch.buyer_id, b.name, ch.seller_id, s.name, ch.created_at, ch.updated_at
    FROM chats ch
    JOIN listings l ON l.id = ch.listing_id
    JOIN users b ON b.id = ch.buyer_id
    JOIN users s ON s.id = ch.seller_id";

impl Database {
    /// Returns the chat for (listing, buyer, seller), creating it with `id` if
    /// absent. The boolean is true when this call created it.
    ///
    /// The insert and the read happen under one lock acquisition and the
    /// triple is UNIQUE in the schema, so concurrent first contacts converge
    /// on a single row.
    pub fn find_or_create_chat(
        &self,
        id: &str,
        listing_id: &str,
        buyer_id: &str,
        seller_id: &str,
    ) -> Result<(ChatRow, bool)> {
        let now = crate::timestamp_now();
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO chats (id, listing_id, buyer_id, seller_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, listing_id, buyer_id, seller_id, now],
            )?;

            let mut stmt = conn.prepare(&format!(
                "{CHAT_SELECT} WHERE ch.listing_id = ?1 AND ch.buyer_id = ?2 AND ch.seller_id = ?3"
            ))?;
            let chat = stmt
                .query_row([listing_id, buyer_id, seller_id], map_chat)
                .optional()?
                .ok_or_else(|| anyhow!("chat for listing {} vanished after insert", listing_id))?;

            Ok((chat, inserted == 1))
        })
    }

    pub fn get_chat(&self, id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{CHAT_SELECT} WHERE ch.id = ?1"))?;
            stmt.query_row([id], map_chat).optional()
        })
    }

    /// Chats where `user_id` is buyer or seller, most recently active first,
    /// each with its latest message and the caller's unread count.
    pub fn list_chats_for_user(&self, user_id: &str) -> Result<Vec<ChatSummaryRow>> {
        self.with_conn(|conn| query_chat_summaries(conn, user_id))
    }
}

fn query_chat_summaries(conn: &Connection, user_id: &str) -> Result<Vec<ChatSummaryRow>> {
    let sql = format!(
        "{CHAT_SELECT}
         WHERE ch.buyer_id = ?1 OR ch.seller_id = ?1
         ORDER BY ch.updated_at DESC, ch.rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let chats = stmt
        .query_map([user_id], map_chat)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut last_stmt = conn.prepare(
        "SELECT content, created_at FROM messages
         WHERE chat_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT 1",
    )?;
    let mut unread_stmt = conn.prepare(
        "SELECT COUNT(*) FROM messages WHERE chat_id = ?1 AND sender_id != ?2 AND is_read = 0",
    )?;

    let mut summaries = Vec::with_capacity(chats.len());
    for chat in chats {
        let last: Option<(String, String)> = last_stmt
            .query_row([&chat.id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;
        let unread: u32 = unread_stmt.query_row([chat.id.as_str(), user_id], |row| row.get(0))?;
        let (last_message, last_message_at) = match last {
            Some((content, at)) => (Some(content), Some(at)),
            None => (None, None),
        };
        summaries.push(ChatSummaryRow { chat, last_message, last_message_at, unread_count: unread });
    }
    Ok(summaries)
}

fn map_chat(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        listing_id: row.get(1)?,
        listing_title: row.get(2)?,
        listing_images: decode_images(3, row.get(3)?)?,
        listing_price: row.get(4)?,
        buyer_id: row.get(5)?,
        buyer_name: row.get(6)?,
        seller_id: row.get(7)?,
        seller_name: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
