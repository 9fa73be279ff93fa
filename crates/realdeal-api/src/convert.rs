//! Row -> wire conversions.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use realdeal_db::models::{ChatRow, ChatSummaryRow, ListingRow, MessageRow, UserRow};
use realdeal_db::seed::PLACEHOLDER_IMAGE;
use realdeal_types::api::{ChatResponse, ChatSummary, MessageResponse};
use realdeal_types::models::{Category, Listing, Seller, User, VerificationLevel};

pub(crate) fn uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by SQLite's datetime('now') have no zone or fraction.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

/// Client-supplied timestamp -> the stored text format, for range comparisons.
pub(crate) fn storage_timestamp(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).ok()?;
    Some(parsed.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub(crate) fn user(row: &UserRow) -> User {
    User {
        id: uuid(&row.id, "user id"),
        email: row.email.clone(),
        name: row.name.clone(),
        phone: row.phone.clone(),
        is_verified: row.is_verified,
        verification_level: row.verification_level.parse().unwrap_or_else(|e| {
            warn!("{} on user '{}'", e, row.id);
            VerificationLevel::None
        }),
        created_at: timestamp(&row.created_at),
        updated_at: timestamp(&row.updated_at),
    }
}

pub(crate) fn listing(row: ListingRow) -> Listing {
    let category_id = uuid(&row.category_id, "category id");
    let seller_id = uuid(&row.seller_id, "seller id");
    Listing {
        id: uuid(&row.id, "listing id"),
        title: row.title,
        description: row.description,
        price: row.price,
        images: row.images,
        condition: row.condition,
        location: row.location,
        is_active: row.is_active,
        is_sold: row.is_sold,
        category_id,
        category: Category { id: category_id, name: row.category_name },
        seller_id,
        seller: Seller {
            id: seller_id,
            name: row.seller_name,
            email: row.seller_email,
            is_verified: row.seller_is_verified,
        },
        created_at: timestamp(&row.created_at),
        updated_at: timestamp(&row.updated_at),
    }
}

pub(crate) fn chat(row: ChatRow) -> ChatResponse {
    ChatResponse {
        id: uuid(&row.id, "chat id"),
        listing_id: uuid(&row.listing_id, "listing id"),
        listing_title: row.listing_title,
        listing_image: row.listing_images.into_iter().next(),
        listing_price: row.listing_price,
        seller_id: uuid(&row.seller_id, "seller id"),
        seller_name: row.seller_name,
        buyer_id: uuid(&row.buyer_id, "buyer id"),
        buyer_name: row.buyer_name,
        created_at: timestamp(&row.created_at),
        updated_at: timestamp(&row.updated_at),
    }
}

/// Summary of `row` from the point of view of `viewer_id`.
pub(crate) fn chat_summary(row: ChatSummaryRow, viewer_id: &str) -> ChatSummary {
    let chat = row.chat;
    let (other_id, other_name) = if chat.buyer_id == viewer_id {
        (chat.seller_id, chat.seller_name)
    } else {
        (chat.buyer_id, chat.buyer_name)
    };
    ChatSummary {
        id: uuid(&chat.id, "chat id"),
        listing_id: uuid(&chat.listing_id, "listing id"),
        listing_title: chat.listing_title,
        listing_image: chat
            .listing_images
            .into_iter()
            .next()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        other_user_id: uuid(&other_id, "user id"),
        other_user_name: other_name,
        last_message: row.last_message.unwrap_or_else(|| "No messages yet".to_string()),
        last_message_time: timestamp(row.last_message_at.as_deref().unwrap_or(&chat.created_at)),
        unread_count: row.unread_count,
    }
}

pub(crate) fn message(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: uuid(&row.id, "message id"),
        chat_id: uuid(&row.chat_id, "chat id"),
        sender_id: uuid(&row.sender_id, "sender id"),
        sender_name: row.sender_name,
        content: row.content,
        timestamp: timestamp(&row.created_at),
        is_read: row.is_read,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_parse_both_stored_formats() {
        let rfc = timestamp("2024-05-01T10:20:30.123Z");
        assert_eq!(rfc.timestamp_subsec_millis(), 123);
        let sqlite = timestamp("2024-05-01 10:20:30");
        assert_eq!(sqlite.timestamp(), rfc.timestamp());
    }

    #[test]
    fn storage_timestamp_normalizes_offsets() {
        assert_eq!(
            storage_timestamp("2024-05-01T12:20:30.5+02:00").as_deref(),
            Some("2024-05-01T10:20:30.500Z")
        );
        assert_eq!(storage_timestamp("yesterday"), None);
    }
}
