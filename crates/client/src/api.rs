use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::{
        assignment::{Assignment, AssignmentStatus, RespondToAssignmentRequest},
        notification::Notification,
        response::{ApiErrorBody, ApiResponse},
        song::{CreateSongRequest, Song},
        suggestion::{CreateSuggestionRequest, Suggestion, SuggestionSlot},
        user::User,
        worship_set::WorshipSetDetail,
    },
};

use crate::{
    config::ClientConfig,
    session::{CredentialExchange, SignedCredentialExchange, WebSession},
};

/// Turns an error response back into the error the server raised. The
/// API reports conflicts and capacity errors as 400 too, so those come
/// back as `Validation`.
pub fn error_for_status(status: StatusCode, message: String) -> WorshipError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => WorshipError::Validation(message),
        StatusCode::UNAUTHORIZED => WorshipError::Authentication(message),
        StatusCode::FORBIDDEN => WorshipError::Authorization(message),
        StatusCode::NOT_FOUND => WorshipError::NotFound(message),
        StatusCode::PAYLOAD_TOO_LARGE => WorshipError::PayloadTooLarge(message),
        _ => WorshipError::Internal(format!("{}: {}", status, message).into()),
    }
}

fn transport_error(err: reqwest::Error) -> WorshipError {
    WorshipError::Internal(Box::new(err))
}

/// REST client acting as one web user at a time.
pub struct ApiClient<E> {
    http: Client,
    base_url: String,
    exchange: E,
}

impl ApiClient<SignedCredentialExchange> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, SignedCredentialExchange::from_config(config))
    }
}

impl<E: CredentialExchange> ApiClient<E> {
    pub fn new(base_url: impl Into<String>, exchange: E) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            exchange,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        session: &WebSession,
        request: RequestBuilder,
    ) -> WorshipResult<T> {
        let token = self.exchange.bearer_token(session).await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!("API responded {} for user {}", status, session.user_id);

        if status.is_success() {
            let body: ApiResponse<T> = response.json().await.map_err(transport_error)?;
            return Ok(body.data);
        }

        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        warn!("API request failed with {}: {}", status, message);
        Err(error_for_status(status, message))
    }

    pub async fn get<T: DeserializeOwned>(&self, session: &WebSession, path: &str) -> WorshipResult<T> {
        self.send(session, self.http.get(self.url(path))).await
    }

    pub async fn post<B, T>(&self, session: &WebSession, path: &str, body: &B) -> WorshipResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(session, self.http.post(self.url(path)).json(body)).await
    }

    pub async fn put<B, T>(&self, session: &WebSession, path: &str, body: &B) -> WorshipResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(session, self.http.put(self.url(path)).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, session: &WebSession, path: &str) -> WorshipResult<T> {
        self.send(session, self.http.delete(self.url(path))).await
    }

    pub async fn me(&self, session: &WebSession) -> WorshipResult<User> {
        self.get(session, "/users/me").await
    }

    pub async fn list_songs(&self, session: &WebSession, search: Option<&str>) -> WorshipResult<Vec<Song>> {
        let mut request = self.http.get(self.url("/songs"));
        if let Some(q) = search {
            request = request.query(&[("q", q)]);
        }
        self.send(session, request).await
    }

    pub async fn create_song(&self, session: &WebSession, song: &CreateSongRequest) -> WorshipResult<Song> {
        self.post(session, "/songs", song).await
    }

    pub async fn worship_set(&self, session: &WebSession, id: Uuid) -> WorshipResult<WorshipSetDetail> {
        self.get(session, &format!("/worship-sets/{}", id)).await
    }

    /// Slots assigned to the session's user.
    pub async fn my_suggestion_slots(&self, session: &WebSession) -> WorshipResult<Vec<SuggestionSlot>> {
        let request = self
            .http
            .get(self.url("/suggestion-slots"))
            .query(&[("assignedUserId", session.user_id.to_string())]);
        self.send(session, request).await
    }

    pub async fn suggest_song(
        &self,
        session: &WebSession,
        suggestion: &CreateSuggestionRequest,
    ) -> WorshipResult<Suggestion> {
        self.post(session, "/suggestions", suggestion).await
    }

    pub async fn submit_slot(&self, session: &WebSession, slot_id: Uuid) -> WorshipResult<SuggestionSlot> {
        let request = self.http.post(self.url(&format!("/suggestion-slots/{}/submit", slot_id)));
        self.send(session, request).await
    }

    pub async fn respond_to_assignment(
        &self,
        session: &WebSession,
        assignment_id: Uuid,
        status: AssignmentStatus,
    ) -> WorshipResult<Assignment> {
        self.put(
            session,
            &format!("/assignments/{}", assignment_id),
            &RespondToAssignmentRequest { status },
        )
        .await
    }

    pub async fn my_notifications(&self, session: &WebSession) -> WorshipResult<Vec<Notification>> {
        self.get(session, &format!("/notifications/user/{}", session.user_id))
            .await
    }
}
