use tonic::{Request, Response, Status};
use uuid::Uuid;

use guestbook_core::guest::{
    CreateGuestRequest, DeleteGuestByIdRequest, FindAllGuestRequest, FindAllGuestResponse,
    FindGuestByIdRequest, GuestResponse, UpdateGuestByIdRequest, DEFAULT_TAKE,
};

use crate::services::GuestService;

use super::proto::{self, guest_service_server};
use super::{request_context, to_status};

impl From<GuestResponse> for proto::GuestResponse {
    fn from(guest: GuestResponse) -> Self {
        Self {
            id: guest.id,
            name: guest.name,
            address: guest.address,
            created_at: guest.created_at,
            created_by: guest.created_by,
            updated_at: guest.updated_at,
            updated_by: guest.updated_by,
        }
    }
}

impl From<FindAllGuestResponse> for proto::FindAllGuestResponse {
    fn from(page: FindAllGuestResponse) -> Self {
        Self {
            list: page.list.into_iter().map(Into::into).collect(),
            count: page.count,
        }
    }
}

/// gRPC callers are anonymous; writes are attributed to the nil UUID.
fn grpc_actor() -> String {
    Uuid::nil().to_string()
}

/// `guestbook.v1.GuestService` backed by [`GuestService`].
#[derive(Clone)]
pub struct GuestGrpc {
    guests: GuestService,
}

impl GuestGrpc {
    pub fn new(guests: GuestService) -> Self {
        Self { guests }
    }

    pub fn into_server(self) -> guest_service_server::GuestServiceServer<Self> {
        guest_service_server::GuestServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl guest_service_server::GuestService for GuestGrpc {
    async fn create_guest(
        &self,
        request: Request<proto::CreateGuestRequest>,
    ) -> Result<Response<proto::GuestResponse>, Status> {
        let ctx = request_context(&request);
        let req = request.into_inner();

        let guest = self
            .guests
            .create(
                &ctx,
                CreateGuestRequest {
                    name: req.name,
                    address: req.address,
                    created_by: grpc_actor(),
                },
            )
            .await
            .map_err(to_status)?;

        Ok(Response::new(guest.into()))
    }

    async fn find_all_guest(
        &self,
        request: Request<proto::FindAllGuestRequest>,
    ) -> Result<Response<proto::FindAllGuestResponse>, Status> {
        let ctx = request_context(&request);
        let req = request.into_inner();

        let take = if req.take == 0 { DEFAULT_TAKE } else { req.take };
        let page = self
            .guests
            .find_all(
                &ctx,
                FindAllGuestRequest {
                    keyword: req.keyword,
                    sorts: req.sorts,
                    take,
                    skip: req.skip,
                },
            )
            .await
            .map_err(to_status)?;

        Ok(Response::new(page.into()))
    }

    async fn find_guest_by_id(
        &self,
        request: Request<proto::FindGuestByIdRequest>,
    ) -> Result<Response<proto::GuestResponse>, Status> {
        let ctx = request_context(&request);
        let req = request.into_inner();

        let guest = self
            .guests
            .find_by_id(&ctx, FindGuestByIdRequest { id: req.id })
            .await
            .map_err(to_status)?;

        Ok(Response::new(guest.into()))
    }

    async fn update_guest_by_id(
        &self,
        request: Request<proto::UpdateGuestByIdRequest>,
    ) -> Result<Response<proto::GuestResponse>, Status> {
        let ctx = request_context(&request);
        let req = request.into_inner();

        let guest = self
            .guests
            .update_by_id(
                &ctx,
                UpdateGuestByIdRequest {
                    id: req.id,
                    name: req.name,
                    address: req.address,
                    updated_by: grpc_actor(),
                },
            )
            .await
            .map_err(to_status)?;

        Ok(Response::new(guest.into()))
    }

    async fn delete_guest_by_id(
        &self,
        request: Request<proto::DeleteGuestByIdRequest>,
    ) -> Result<Response<proto::DeleteGuestByIdResponse>, Status> {
        let ctx = request_context(&request);
        let req = request.into_inner();

        self.guests
            .delete_by_id(
                &ctx,
                DeleteGuestByIdRequest {
                    id: req.id,
                    deleted_by: grpc_actor(),
                },
            )
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::DeleteGuestByIdResponse {}))
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use tonic::Code;

    use super::guest_service_server::GuestService as _;
    use super::*;
    use crate::state::test_support;

    async fn grpc() -> GuestGrpc {
        GuestGrpc::new(test_support::state().await.guests)
    }

    async fn create(grpc: &GuestGrpc, name: &str) -> proto::GuestResponse {
        grpc.create_guest(Request::new(proto::CreateGuestRequest {
            name: name.into(),
            address: String::new(),
        }))
        .await
        .unwrap()
        .into_inner()
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() {
        let grpc = grpc().await;
        let created = create(&grpc, "Arya").await;

        let found = grpc
            .find_guest_by_id(Request::new(proto::FindGuestByIdRequest {
                id: created.id.clone(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(found, created);
        assert_eq!(found.created_by, Uuid::nil().to_string());
    }

    #[tokio::test]
    async fn test_find_all_defaults_take() {
        let grpc = grpc().await;
        for i in 0..11 {
            create(&grpc, &format!("Guest {i:02}")).await;
        }

        let page = grpc
            .find_all_guest(Request::new(proto::FindAllGuestRequest::default()))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(page.list.len(), 10);
        assert_eq!(page.count, 11);
    }

    #[tokio::test]
    async fn test_validation_error_is_invalid_argument() {
        let status = grpc()
            .await
            .create_guest(Request::new(proto::CreateGuestRequest::default()))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "name is a required field");
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let grpc = grpc().await;
        let created = create(&grpc, "Bran").await;

        let updated = grpc
            .update_guest_by_id(Request::new(proto::UpdateGuestByIdRequest {
                id: created.id.clone(),
                name: "Bran Stark".into(),
                address: "Winterfell".into(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(updated.name, "Bran Stark");
        assert_eq!(updated.created_at, created.created_at);

        grpc.delete_guest_by_id(Request::new(proto::DeleteGuestByIdRequest {
            id: created.id.clone(),
        }))
        .await
        .unwrap();

        let status = grpc
            .find_guest_by_id(Request::new(proto::FindGuestByIdRequest { id: created.id }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }
}
