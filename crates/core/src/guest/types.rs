use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{Entity, RepositoryError, Result, Row, Value};

/// Column names of the `guests` table.
pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const ADDRESS: &str = "address";
    pub const CREATED_AT: &str = "created_at";
    pub const CREATED_BY: &str = "created_by";
    pub const UPDATED_AT: &str = "updated_at";
    pub const UPDATED_BY: &str = "updated_by";
    pub const DELETED_AT: &str = "deleted_at";
    pub const DELETED_BY: &str = "deleted_by";
}

/// A guest record. Timestamps are unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub created_at: i64,
    pub created_by: String,
    pub updated_at: Option<i64>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<i64>,
    pub deleted_by: Option<String>,
}

impl Guest {
    /// Soft-deletes the guest.
    pub fn mark_deleted(&mut self, deleted_by: &str, now_ms: i64) {
        self.deleted_at = Some(now_ms);
        self.deleted_by = Some(deleted_by.to_string());
    }
}

impl Entity for Guest {
    const TABLE: &'static str = "guests";
    const COLUMNS: &'static [&'static str] = &[
        columns::ID,
        columns::NAME,
        columns::ADDRESS,
        columns::CREATED_AT,
        columns::CREATED_BY,
        columns::UPDATED_AT,
        columns::UPDATED_BY,
        columns::DELETED_AT,
        columns::DELETED_BY,
    ];
    const PRIMARY_KEY: &'static str = columns::ID;
    const NAME: &'static str = "Guest";

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.address.clone().into(),
            self.created_at.into(),
            self.created_by.clone().into(),
            self.updated_at.into(),
            self.updated_by.clone().into(),
            self.deleted_at.into(),
            self.deleted_by.clone().into(),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        let id = row.text(columns::ID)?;
        Ok(Self {
            id: Uuid::parse_str(&id)
                .map_err(|e| RepositoryError::Serialization(format!("invalid guest id: {e}")))?,
            name: row.text(columns::NAME)?,
            address: row.opt_text(columns::ADDRESS)?,
            created_at: row.integer(columns::CREATED_AT)?,
            created_by: row.text(columns::CREATED_BY)?,
            updated_at: row.opt_integer(columns::UPDATED_AT)?,
            updated_by: row.opt_text(columns::UPDATED_BY)?,
            deleted_at: row.opt_integer(columns::DELETED_AT)?,
            deleted_by: row.opt_text(columns::DELETED_BY)?,
        })
    }
}

pub(super) fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// Flat projection of a [`Guest`] carried by events and webhooks.
///
/// Empty strings and zero timestamps are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestEvent {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub address: String,
    pub created_at: i64,
    pub created_by: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub updated_at: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated_by: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub deleted_at: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deleted_by: String,
}

impl From<&Guest> for GuestEvent {
    fn from(guest: &Guest) -> Self {
        Self {
            id: guest.id.to_string(),
            name: guest.name.clone(),
            address: guest.address.clone().unwrap_or_default(),
            created_at: guest.created_at,
            created_by: guest.created_by.clone(),
            updated_at: guest.updated_at.unwrap_or_default(),
            updated_by: guest.updated_by.clone().unwrap_or_default(),
            deleted_at: guest.deleted_at.unwrap_or_default(),
            deleted_by: guest.deleted_by.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventEnvelope;
    use crate::RequestContext;

    fn guest() -> Guest {
        Guest {
            id: Uuid::parse_str("0190a4b2-7c3e-7def-8a12-3456789abcde").unwrap(),
            name: "John Snow".into(),
            address: None,
            created_at: 1_700_000_000_000,
            created_by: Uuid::nil().to_string(),
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_values_roundtrip_through_row() {
        let guest = guest();
        let row = Row::new(
            Guest::COLUMNS
                .iter()
                .map(|c| c.to_string())
                .zip(guest.to_values())
                .collect(),
        );

        assert_eq!(Guest::from_row(&row).unwrap(), guest);
    }

    #[test]
    fn test_mark_deleted() {
        let mut guest = guest();
        guest.mark_deleted("admin", 42);

        assert_eq!(guest.deleted_at, Some(42));
        assert_eq!(guest.deleted_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_event_omits_empty_fields() {
        let event = GuestEvent::from(&guest());
        let json = serde_json::to_value(&event).unwrap();

        assert!(json.get("address").is_none());
        assert!(json.get("updated_at").is_none());
        assert!(json.get("deleted_by").is_none());
        assert_eq!(json["name"], "John Snow");
    }

    #[test]
    fn test_event_survives_envelope_roundtrip() {
        let mut guest = guest();
        guest.address = Some("Winterfell".into());
        guest.mark_deleted("admin", 99);
        let event = GuestEvent::from(&guest);
        let ctx = RequestContext::default();

        let bytes = EventEnvelope::new(&ctx, "guest.deleted", &event)
            .to_bytes()
            .unwrap();
        let decoded = EventEnvelope::<GuestEvent>::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.message, event);
        assert_eq!(decoded.event_name, "guest.deleted");
    }
}
