//! Shared HTTP plumbing: response envelope, error mapping, extractors

mod acting_user;
mod api_error;
mod api_response;
mod validated_json;

pub use acting_user::{ActingUser, USER_ID_HEADER};
pub use api_error::ApiError;
pub use api_response::{ApiResponse, EmptyData, PaginatedResponse, PaginationParams};
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
