use serde::{Deserialize, Serialize};

use super::types::is_zero;
use super::Guest;

/// Empty optional fields are left out of the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestResponse {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    pub created_at: i64,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_by: String,
}

impl From<&Guest> for GuestResponse {
    fn from(guest: &Guest) -> Self {
        Self {
            id: guest.id.to_string(),
            name: guest.name.clone(),
            address: guest.address.clone().unwrap_or_default(),
            created_at: guest.created_at,
            created_by: guest.created_by.clone(),
            updated_at: guest.updated_at.unwrap_or_default(),
            updated_by: guest.updated_by.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindAllGuestResponse {
    pub list: Vec<GuestResponse>,
    pub count: u64,
}

impl FindAllGuestResponse {
    pub fn new(guests: &[Guest], count: u64) -> Self {
        Self {
            list: guests.iter().map(GuestResponse::from).collect(),
            count,
        }
    }
}
