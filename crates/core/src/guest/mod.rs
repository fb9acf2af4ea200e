//! The guest entity and the pure parts of its service: request validation,
//! sort parsing, filters and response mapping.

mod filters;
mod requests;
mod responses;
mod sorting;
mod types;
mod validation;

pub use filters::{active_filter, by_id_filter, find_all_filter};
pub use requests::{
    CreateGuestRequest, DeleteGuestByIdRequest, FindAllGuestRequest, FindGuestByIdRequest,
    UpdateGuestByIdRequest, DEFAULT_TAKE,
};
pub use responses::{FindAllGuestResponse, GuestResponse};
pub use sorting::parse_sorts;
pub use types::{columns, Guest, GuestEvent};
pub use validation::{validate_required, validate_uuid};
