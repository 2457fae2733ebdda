use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::Validate;
use worship_core::errors::WorshipError;

use super::error_handling::AppError;

/// JSON body extractor that also runs the payload's `validator` rules.
///
/// Oversized bodies are rejected with 413; malformed JSON, wrong types
/// (such as a non-UUID id) and rule violations with 400.
pub struct ValidatedJson<T>(pub T);

/// Maps axum's JSON rejection onto the error taxonomy.
pub fn reject_json(rejection: JsonRejection) -> WorshipError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        WorshipError::PayloadTooLarge("Request body exceeds the size limit".to_string())
    } else {
        WorshipError::Validation(rejection.body_text())
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(reject_json)?;

        value.validate().map_err(WorshipError::from)?;

        Ok(Self(value))
    }
}
