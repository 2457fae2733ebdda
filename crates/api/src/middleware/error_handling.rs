//! # Error Handling Middleware
//!
//! Maps [`WorshipError`] onto HTTP status codes and the
//! `{ "error": { "message": ... } }` body shared with the client crate.
//! Server-side failures are logged here and answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use worship_core::{errors::WorshipError, models::response::ApiErrorBody};

/// Wraps a [`WorshipError`] so handlers can return it with `?`.
///
/// ```ignore
/// async fn handler(State(state): State<Arc<ApiState>>) -> Result<Json<ApiResponse<Song>>, AppError> {
///     let song = songs::get_song_by_id(&state.db_pool, id)
///         .await
///         .map_err(WorshipError::Database)?
///         .ok_or_else(|| WorshipError::not_found("Song", id))?;
///     Ok(Json(ApiResponse::new(song.into())))
/// }
/// ```
#[derive(Debug)]
pub struct AppError(pub WorshipError);

/// Status code for each error kind.
pub fn status_for(error: &WorshipError) -> StatusCode {
    match error {
        WorshipError::NotFound(_) => StatusCode::NOT_FOUND,
        WorshipError::Validation(_)
        | WorshipError::Conflict(_)
        | WorshipError::Capacity(_) => StatusCode::BAD_REQUEST,
        WorshipError::Authentication(_) => StatusCode::UNAUTHORIZED,
        WorshipError::Authorization(_) => StatusCode::FORBIDDEN,
        WorshipError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        WorshipError::Database(_) | WorshipError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        let message = if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ApiErrorBody::new(message))).into_response()
    }
}

impl From<WorshipError> for AppError {
    fn from(err: WorshipError) -> Self {
        AppError(err)
    }
}

/// Lets handlers use `?` directly on repository calls returning
/// `eyre::Result`; such failures are database errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(WorshipError::Database(err))
    }
}

pub fn map_error(err: WorshipError) -> Response {
    AppError(err).into_response()
}
