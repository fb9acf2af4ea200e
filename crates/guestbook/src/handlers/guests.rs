//! `/guests` endpoints.
//!
//! HTTP requests carry no caller identity, so the nil UUID is recorded as
//! the actor of every write.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use guestbook_core::guest::{
    CreateGuestRequest, DeleteGuestByIdRequest, FindAllGuestRequest, FindGuestByIdRequest,
    UpdateGuestByIdRequest, DEFAULT_TAKE,
};

use crate::{context::Ctx, state::AppState};

use super::{response::success, AppError};

fn http_actor() -> String {
    Uuid::nil().to_string()
}

/// Body of `POST /guests` and `PUT /guests/{id}`.
#[derive(Debug, Deserialize)]
pub struct GuestPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Query of `GET /guests`.
#[derive(Debug, Default, Deserialize)]
pub struct FindAllQuery {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub sorts: String,
    pub take: Option<u64>,
    pub skip: Option<u64>,
}

impl From<FindAllQuery> for FindAllGuestRequest {
    fn from(query: FindAllQuery) -> Self {
        Self {
            keyword: query.keyword,
            sorts: query.sorts,
            take: query.take.filter(|t| *t > 0).unwrap_or(DEFAULT_TAKE),
            skip: query.skip.unwrap_or_default(),
        }
    }
}

/// Create a guest (POST /guests).
pub async fn create_guest(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    payload: Result<Json<GuestPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let request = CreateGuestRequest {
        name: payload.name,
        address: payload.address,
        created_by: http_actor(),
    };

    let guest = state.guests.create(&ctx, request).await?;
    Ok(success(StatusCode::CREATED, guest))
}

/// List guests (GET /guests).
pub async fn list_guests(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    query: Result<Query<FindAllQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let page = state.guests.find_all(&ctx, query.into()).await?;
    Ok(success(StatusCode::OK, page))
}

/// Get a guest by ID (GET /guests/{id}).
pub async fn get_guest(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let guest = state
        .guests
        .find_by_id(&ctx, FindGuestByIdRequest { id })
        .await?;
    Ok(success(StatusCode::OK, guest))
}

/// Update a guest by ID (PUT /guests/{id}).
pub async fn update_guest(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<GuestPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let request = UpdateGuestByIdRequest {
        id,
        name: payload.name,
        address: payload.address,
        updated_by: http_actor(),
    };

    let guest = state.guests.update_by_id(&ctx, request).await?;
    Ok(success(StatusCode::OK, guest))
}

/// Soft-delete a guest by ID (DELETE /guests/{id}).
pub async fn delete_guest(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let request = DeleteGuestByIdRequest {
        id,
        deleted_by: http_actor(),
    };

    state.guests.delete_by_id(&ctx, request).await?;
    Ok(success(StatusCode::OK, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_take() {
        let request = FindAllGuestRequest::from(FindAllQuery::default());
        assert_eq!(request.take, DEFAULT_TAKE);
        assert_eq!(request.skip, 0);

        let request = FindAllGuestRequest::from(FindAllQuery {
            take: Some(0),
            ..Default::default()
        });
        assert_eq!(request.take, DEFAULT_TAKE);

        let request = FindAllGuestRequest::from(FindAllQuery {
            take: Some(3),
            skip: Some(6),
            ..Default::default()
        });
        assert_eq!((request.take, request.skip), (3, 6));
    }
}
