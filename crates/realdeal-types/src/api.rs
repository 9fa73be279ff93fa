use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub authenticated: bool,
}

// -- Listings --

/// Browser forms send prices either as JSON numbers or as the raw input text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    /// Returns the price if it is a finite, strictly positive number.
    pub fn value(&self) -> Option<f64> {
        let price = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub category_id: Option<String>,
    pub images: Option<Vec<String>>,
    pub condition: Option<String>,
    pub location: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub category_id: Option<String>,
    pub images: Option<Vec<String>>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
    pub is_sold: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingStatusRequest {
    pub is_sold: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// -- Chats --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    pub listing_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub listing_title: String,
    pub listing_image: String,
    pub other_user_id: Uuid,
    pub other_user_name: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub listing_title: String,
    pub listing_image: Option<String>,
    pub listing_price: f64,
    pub seller_id: Uuid,
    pub seller_name: String,
    pub buyer_id: Uuid,
    pub buyer_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub success: bool,
    pub messages_marked_as_read: usize,
}

// -- Uploads --

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<String>,
}

// -- Demo data --

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub success: bool,
    pub message: String,
    pub details: SeedDetails,
}

#[derive(Debug, Serialize)]
pub struct SeedDetails {
    pub categories: usize,
    pub users: usize,
    pub listings: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_accepts_number_and_text() {
        let n: PriceInput = serde_json::from_str("120.5").unwrap();
        assert_eq!(n.value(), Some(120.5));
        let s: PriceInput = serde_json::from_str("\" 99 \"").unwrap();
        assert_eq!(s.value(), Some(99.0));
    }

    #[test]
    fn price_rejects_zero_and_garbage() {
        assert_eq!(PriceInput::Number(0.0).value(), None);
        assert_eq!(PriceInput::Number(-3.0).value(), None);
        assert_eq!(PriceInput::Text("cheap".into()).value(), None);
    }

    #[test]
    fn create_listing_ignores_client_seller_id() {
        let req: CreateListingRequest = serde_json::from_str(
            r#"{"title":"Desk","price":"10","categoryId":"x","sellerId":"anonymous"}"#,
        )
        .unwrap();
        assert_eq!(req.title.as_deref(), Some("Desk"));
        assert!(req.description.is_none());
    }
}
