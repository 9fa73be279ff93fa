/// Database row types: these map directly to SQLite rows.
/// Distinct from realdeal-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub phone: Option<String>,
    pub is_verified: bool,
    pub verification_level: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
}

pub struct CategoryRow {
    pub id: String,
    pub name: String,
}

/// A listing joined with its category and seller.
pub struct ListingRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub condition: String,
    pub location: String,
    pub is_active: bool,
    pub is_sold: bool,
    pub category_id: String,
    pub category_name: String,
    pub seller_id: String,
    pub seller_name: String,
    pub seller_email: String,
    pub seller_is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewListing<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub price: f64,
    pub images: &'a [String],
    pub condition: &'a str,
    pub location: &'a str,
    pub seller_id: &'a str,
    pub category_id: &'a str,
}

/// Column changes for a listing. `None` leaves the column as it is.
#[derive(Debug, Default, Clone)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub category_id: Option<String>,
    pub is_active: Option<bool>,
    pub is_sold: Option<bool>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.images.is_none()
            && self.condition.is_none()
            && self.location.is_none()
            && self.category_id.is_none()
            && self.is_active.is_none()
            && self.is_sold.is_none()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ListingFilter {
    /// Category name, matched case-insensitively.
    pub category: Option<String>,
    pub category_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Matched case-insensitively.
    pub condition: Option<String>,
    pub seller_id: Option<String>,
    /// Substring of title or description, case-insensitive.
    pub search: Option<String>,
    pub include_inactive: bool,
    pub limit: Option<u32>,
}

/// A chat joined with the listing and both participants.
pub struct ChatRow {
    pub id: String,
    pub listing_id: String,
    pub listing_title: String,
    pub listing_images: Vec<String>,
    pub listing_price: f64,
    pub buyer_id: String,
    pub buyer_name: String,
    pub seller_id: String,
    pub seller_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ChatRow {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}

pub struct ChatSummaryRow {
    pub chat: ChatRow,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub unread_count: u32,
}

pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}
