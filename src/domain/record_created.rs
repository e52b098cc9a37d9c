//! "Record created" coherence notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{InvalidShortCode, RedirectRecord, ShortCode};

/// Reasons a coherence notification cannot be turned into a record.
#[derive(Debug, thiserror::Error)]
pub enum InvalidEvent {
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("invalid short code: {0}")]
    ShortCode(#[from] InvalidShortCode),
    #[error("invalid target url: {0}")]
    TargetUrl(#[from] url::ParseError),
}

/// A notification that a new mapping exists somewhere in the fleet.
///
/// Carries the full record so subscribers can warm their tiers without a
/// store read. Delivery is at-most-once and may be duplicated or reordered;
/// applying the same event twice overwrites a tier with an identical value.
///
/// # Wire Format
///
/// ```json
/// {"eventId":"…","shortCode":"abc123","targetUrl":"https://example.com","createdAt":"2024-05-01T12:00:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCreated {
    pub event_id: String,
    pub short_code: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
}

impl RecordCreated {
    /// Builds a notification for a freshly created record with a new event id.
    pub fn for_record(record: &RedirectRecord) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            short_code: record.short_code.to_string(),
            target_url: record.target_url.clone(),
            created_at: record.created_at,
        }
    }

    /// Decodes a JSON payload received from the broadcast channel.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEvent::Payload`] if the JSON does not match the wire format.
    pub fn from_payload(payload: &str) -> Result<Self, InvalidEvent> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Encodes the notification for publishing.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Validates the payload fields and builds the record it announces.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEvent`] if the short code or target URL is malformed.
    pub fn to_record(&self) -> Result<RedirectRecord, InvalidEvent> {
        let short_code = ShortCode::parse(self.short_code.as_str())?;
        url::Url::parse(&self.target_url)?;

        Ok(RedirectRecord::new(
            short_code,
            self.target_url.clone(),
            self.created_at,
        ))
    }
}
