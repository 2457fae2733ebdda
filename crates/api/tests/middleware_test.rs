use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use pretty_assertions::assert_eq;
use rstest::rstest;
use worship_api::middleware::{auth, error_handling::map_error};
use worship_core::{errors::WorshipError, policy::Action};

#[rstest]
#[case(WorshipError::NotFound("Song".to_string()), StatusCode::NOT_FOUND)]
#[case(WorshipError::Validation("bad".to_string()), StatusCode::BAD_REQUEST)]
#[case(WorshipError::Conflict("taken".to_string()), StatusCode::BAD_REQUEST)]
#[case(WorshipError::Capacity("full".to_string()), StatusCode::BAD_REQUEST)]
#[case(WorshipError::Authentication("no token".to_string()), StatusCode::UNAUTHORIZED)]
#[case(WorshipError::forbidden(), StatusCode::FORBIDDEN)]
#[case(WorshipError::PayloadTooLarge("big".to_string()), StatusCode::PAYLOAD_TOO_LARGE)]
#[case(WorshipError::Database(eyre::eyre!("connection reset")), StatusCode::INTERNAL_SERVER_ERROR)]
fn errors_map_to_status(#[case] error: WorshipError, #[case] expected: StatusCode) {
    assert_eq!(map_error(error).status(), expected);
}

#[test]
fn internal_errors_map_to_500() {
    let error = WorshipError::Internal(Box::new(std::io::Error::other("disk on fire")));

    assert_eq!(map_error(error).status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn server_errors_hide_details() {
    let response = map_error(WorshipError::Database(eyre::eyre!("password=hunter2")));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body: serde_json::Value = serde_json::from_slice(&body).expect("json body");

    assert_eq!(body["error"]["message"], "Internal server error");
}

#[tokio::test]
async fn client_errors_keep_their_message() {
    let response = map_error(WorshipError::not_found("Song", "abc"));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body: serde_json::Value = serde_json::from_slice(&body).expect("json body");

    assert_eq!(
        body["error"]["message"],
        "Resource not found: Song with ID abc not found"
    );
}

#[test]
fn hashed_password_verifies() {
    let hash = auth::hash_password("correct horse").expect("hash");
    let parsed = PasswordHash::new(&hash).expect("phc string");

    assert!(Argon2::default()
        .verify_password(b"correct horse", &parsed)
        .is_ok());
    assert!(Argon2::default()
        .verify_password(b"wrong horse", &parsed)
        .is_err());
}

#[test]
fn same_password_hashes_differently() {
    let first = auth::hash_password("same").expect("hash");
    let second = auth::hash_password("same").expect("hash");

    assert_ne!(first, second);
}

#[rstest]
#[case("Bearer abc.def.ghi", Some("abc.def.ghi"))]
#[case("bearer abc.def.ghi", Some("abc.def.ghi"))]
#[case("Basic dXNlcjpwYXNz", None)]
#[case("Bearer", None)]
#[case("Bearer a b", None)]
fn bearer_token_parsing(#[case] header_value: &str, #[case] expected: Option<&str>) {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(header_value).expect("header value"),
    );

    assert_eq!(auth::bearer_token(&headers).ok(), expected);
}

#[test]
fn missing_authorization_header_is_authentication_error() {
    let headers = HeaderMap::new();
    let result = auth::bearer_token(&headers);

    assert!(matches!(result, Err(WorshipError::Authentication(_))));
}

#[rstest]
#[case(Method::GET, Action::Read)]
#[case(Method::POST, Action::Create)]
#[case(Method::PUT, Action::Update)]
#[case(Method::PATCH, Action::Update)]
#[case(Method::DELETE, Action::Delete)]
fn methods_map_to_actions(#[case] method: Method, #[case] expected: Action) {
    assert_eq!(auth::action_for_method(&method), expected);
}
