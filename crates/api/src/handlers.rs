pub mod assignments;
pub mod auth;
pub mod instruments;
pub mod notifications;
pub mod service_types;
pub mod services;
pub mod songs;
pub mod suggestion_slots;
pub mod suggestions;
pub mod users;
pub mod worship_sets;

use axum::{Json, http::StatusCode};
use worship_core::models::response::ApiResponse;

use crate::middleware::error_handling::AppError;

/// A `{ "data": ... }` response.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// A `201 Created` with a `{ "data": ... }` body.
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::new(data)))
}

pub(crate) fn created<T>(data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::new(data))))
}
