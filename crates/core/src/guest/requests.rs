use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FieldError, ServiceError};

use super::{validate_required, validate_uuid, Guest};

/// Page size used when a transport gets no (or a zero) `take`.
pub const DEFAULT_TAKE: u64 = 10;

fn finish(errors: Vec<FieldError>) -> Result<(), ServiceError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::bad_request(errors))
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| {
        ServiceError::invalid_field("id", "id must be a valid RFC4122 UUID")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGuestRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub created_by: String,
}

impl CreateGuestRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let mut errors = Vec::new();
        validate_required("name", &self.name, &mut errors);
        validate_required("created_by", &self.created_by, &mut errors);
        finish(errors)
    }

    /// Builds a new guest with a time-ordered id.
    pub fn to_guest(&self, now_ms: i64) -> Guest {
        Guest {
            id: Uuid::now_v7(),
            name: self.name.clone(),
            address: non_empty(&self.address),
            created_at: now_ms,
            created_by: self.created_by.clone(),
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteGuestByIdRequest {
    pub id: String,
    #[serde(default)]
    pub deleted_by: String,
}

impl DeleteGuestByIdRequest {
    /// Validates the request and returns the parsed id.
    pub fn validate(&self) -> Result<Uuid, ServiceError> {
        let mut errors = Vec::new();
        validate_uuid("id", &self.id, &mut errors);
        validate_required("deleted_by", &self.deleted_by, &mut errors);
        finish(errors)?;
        parse_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindAllGuestRequest {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub sorts: String,
    pub take: u64,
    #[serde(default)]
    pub skip: u64,
}

impl Default for FindAllGuestRequest {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            sorts: String::new(),
            take: DEFAULT_TAKE,
            skip: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindGuestByIdRequest {
    pub id: String,
}

impl FindGuestByIdRequest {
    pub fn validate(&self) -> Result<Uuid, ServiceError> {
        let mut errors = Vec::new();
        validate_uuid("id", &self.id, &mut errors);
        finish(errors)?;
        parse_id(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGuestByIdRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub updated_by: String,
}

impl UpdateGuestByIdRequest {
    pub fn validate(&self) -> Result<Uuid, ServiceError> {
        let mut errors = Vec::new();
        validate_uuid("id", &self.id, &mut errors);
        validate_required("name", &self.name, &mut errors);
        validate_required("updated_by", &self.updated_by, &mut errors);
        finish(errors)?;
        parse_id(&self.id)
    }

    /// Applies the update onto an existing guest, keeping `created_*`.
    pub fn apply(&self, guest: &mut Guest, now_ms: i64) {
        guest.name = self.name.clone();
        guest.address = non_empty(&self.address);
        guest.updated_at = Some(now_ms);
        guest.updated_by = Some(self.updated_by.clone());
    }
}
