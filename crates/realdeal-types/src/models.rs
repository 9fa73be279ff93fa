use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How far a user has gone through identity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationLevel {
    #[default]
    None,
    Basic,
    Full,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Basic => "BASIC",
            Self::Full => "FULL",
        }
    }
}

impl fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "BASIC" => Ok(Self::Basic),
            "FULL" => Ok(Self::Full),
            other => Err(format!("unknown verification level: {other}")),
        }
    }
}

/// A registered account. The password hash never leaves the DB layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub is_verified: bool,
    pub verification_level: VerificationLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Public view of the user who owns a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub condition: String,
    pub location: String,
    pub is_active: bool,
    pub is_sold: bool,
    pub category_id: Uuid,
    pub category: Category,
    pub seller_id: Uuid,
    pub seller: Seller,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_level_parses_any_case() {
        assert_eq!("basic".parse::<VerificationLevel>().unwrap(), VerificationLevel::Basic);
        assert_eq!("FULL".parse::<VerificationLevel>().unwrap(), VerificationLevel::Full);
        assert!("gold".parse::<VerificationLevel>().is_err());
    }

    #[test]
    fn verification_level_serializes_uppercase() {
        let json = serde_json::to_string(&VerificationLevel::None).unwrap();
        assert_eq!(json, "\"NONE\"");
    }
}
