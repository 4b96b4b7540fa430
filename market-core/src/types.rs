use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing category. Determines which backend collection and normalization
/// rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Mobile,
    Car,
    Bike,
    Laptop,
}

impl EntityType {
    /// Fixed priority order used for merging and for picking the next source to advance.
    pub const ORDER: [EntityType; 4] = [
        EntityType::Mobile,
        EntityType::Car,
        EntityType::Bike,
        EntityType::Laptop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Mobile => "mobile",
            EntityType::Car => "car",
            EntityType::Bike => "bike",
            EntityType::Laptop => "laptop",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityType::Mobile => "Mobile",
            EntityType::Car => "Car",
            EntityType::Bike => "Bike",
            EntityType::Laptop => "Laptop",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    InNegotiation,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::InNegotiation => "IN_NEGOTIATION",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Completed => "COMPLETED",
        }
    }

    /// Rejected and completed negotiations are frozen.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Completed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderType {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub sender_id: i64,
    pub sender_type: SenderType,
    pub message: String,
    pub timestamp: String,
}

/// A buyer-initiated negotiation thread about one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub request_id: i64,
    #[serde(rename = "mobileId", alias = "listingId")]
    pub listing_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub status: RequestStatus,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub conversation: Vec<ConversationMessage>,
}

impl ChatRequest {
    pub fn accepts_messages(&self) -> bool {
        !self.status.is_terminal()
    }

    /// `updatedAt` when present, otherwise `createdAt`, in epoch millis.
    pub fn last_activity_millis(&self) -> i64 {
        self.updated_at
            .as_deref()
            .and_then(parse_timestamp_millis)
            .or_else(|| parse_timestamp_millis(&self.created_at))
            .unwrap_or(0)
    }
}

/// Timestamp as it appears on the wire: epoch millis or a date string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            RawTimestamp::Millis(millis) => Some(*millis),
            RawTimestamp::Text(text) => parse_timestamp_millis(text),
        }
    }
}

/// Parses RFC 3339 or a zone-less ISO date-time (taken as UTC) into epoch millis.
pub fn parse_timestamp_millis(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp_millis());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}
