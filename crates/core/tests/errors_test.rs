use std::error::Error;
use worship_core::errors::{WorshipError, WorshipResult};

#[test]
fn test_worship_error_display() {
    let not_found = WorshipError::NotFound("Song not found".to_string());
    let validation = WorshipError::Validation("Invalid input".to_string());
    let authentication = WorshipError::Authentication("Missing token".to_string());
    let authorization = WorshipError::Authorization("Not authorized".to_string());
    let conflict = WorshipError::Conflict("Instrument code already exists".to_string());
    let capacity = WorshipError::Capacity("Slot is full".to_string());
    let database = WorshipError::Database(eyre::eyre!("Database connection failed"));
    let internal = WorshipError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    assert_eq!(not_found.to_string(), "Resource not found: Song not found");
    assert_eq!(validation.to_string(), "Validation error: Invalid input");
    assert_eq!(
        authentication.to_string(),
        "Authentication error: Missing token"
    );
    assert_eq!(
        authorization.to_string(),
        "Authorization error: Not authorized"
    );
    assert_eq!(
        conflict.to_string(),
        "Conflict: Instrument code already exists"
    );
    assert_eq!(capacity.to_string(), "Capacity exceeded: Slot is full");
    assert!(database.to_string().contains("Database error:"));
    assert!(internal.to_string().contains("Internal server error:"));
}

#[test]
fn test_not_found_helper() {
    let id = uuid::Uuid::nil();
    let error = WorshipError::not_found("Song", id);

    assert_eq!(
        error.to_string(),
        format!("Resource not found: Song with ID {} not found", id)
    );
}

#[test]
fn test_forbidden_helper_is_authorization() {
    assert!(matches!(
        WorshipError::forbidden(),
        WorshipError::Authorization(_)
    ));
}

#[test]
fn test_internal_keeps_source() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let worship_error = WorshipError::Internal(Box::new(io_error));

    assert!(worship_error.source().is_some());
    assert!(worship_error.to_string().contains("IO error"));
}

#[test]
fn test_worship_result() {
    let result: WorshipResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: WorshipResult<i32> = Err(WorshipError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_eyre_conversion() {
    let error: WorshipError = eyre::eyre!("pool timed out").into();

    assert!(matches!(error, WorshipError::Database(_)));
    assert!(error.to_string().contains("pool timed out"));
}
