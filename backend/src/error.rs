use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::{json, Json};
use thiserror::Error;

use shared::error::{Error as DomainError, ErrorCode, ErrorResponse};
use shared::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Domain(#[from] DomainError),
    #[error("Poll validation failed")]
    Validation(Vec<ValidationError>),
    #[error("Invalid identifier")]
    InvalidId,
}

impl ApiError {
    fn status(&self) -> Status {
        match self {
            ApiError::Domain(error) => match error.code {
                ErrorCode::PermissionDenied => Status::Forbidden,
                ErrorCode::NotFound => Status::NotFound,
                ErrorCode::IdentityRequired => Status::Unauthorized,
                ErrorCode::StorageFull => Status::InsufficientStorage,
                ErrorCode::Transient => Status::ServiceUnavailable,
                ErrorCode::InvalidInput => Status::BadRequest,
            },
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::InvalidId => Status::BadRequest,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => {
                Json(json!({ "error": self.to_string(), "fields": errors })).respond_to(req)?
            }
            _ => Json(ErrorResponse { error: self.to_string() }).respond_to(req)?,
        };

        rocket::Response::build_from(body).status(status).ok()
    }
}
