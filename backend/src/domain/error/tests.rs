//! Tests for the domain error payload and its code taxonomy.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn sold_out_error() -> Error {
    Error::new(ErrorCode::SoldOut, "flight AA/101 is sold out")
        .with_details(json!({"airline": "AA", "flightNum": "101"}))
}

#[rstest]
fn invalid_request_constructor_sets_code() {
    let err = Error::invalid_request("bad");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn new_substitutes_blank_messages() {
    let err = Error::new(ErrorCode::FlightCancelled, "");
    assert_eq!(err.message(), "flight is cancelled");
}

#[rstest]
#[case(ErrorCode::FlightNotFound, ErrorCategory::NotFound)]
#[case(ErrorCode::CustomerNotFound, ErrorCategory::NotFound)]
#[case(ErrorCode::AgentNotFound, ErrorCategory::NotFound)]
#[case(ErrorCode::SoldOut, ErrorCategory::Conflict)]
#[case(ErrorCode::FlightCancelled, ErrorCategory::Conflict)]
#[case(ErrorCode::AllocationConflict, ErrorCategory::Conflict)]
#[case(ErrorCode::DuplicateRegistration, ErrorCategory::Conflict)]
#[case(ErrorCode::PermissionDenied, ErrorCategory::PermissionDenied)]
#[case(ErrorCode::NotAdmin, ErrorCategory::PermissionDenied)]
#[case(ErrorCode::AgentNotAuthorizedForAirline, ErrorCategory::PermissionDenied)]
#[case(ErrorCode::InvalidTimeRange, ErrorCategory::Validation)]
#[case(ErrorCode::InvalidReference, ErrorCategory::Validation)]
#[case(ErrorCode::ServiceUnavailable, ErrorCategory::TransientStore)]
#[case(ErrorCode::InternalError, ErrorCategory::Internal)]
fn codes_map_onto_categories(#[case] code: ErrorCode, #[case] expected: ErrorCategory) {
    assert_eq!(code.category(), expected);
}

#[rstest]
fn only_transient_store_errors_are_retryable() {
    assert!(Error::service_unavailable("pool exhausted").is_retryable());
    assert!(!Error::new(ErrorCode::SoldOut, "full").is_retryable());
    assert!(!Error::new(ErrorCode::AllocationConflict, "raced").is_retryable());
    assert!(!Error::internal("boom").is_retryable());
}

#[rstest]
fn serialises_with_snake_case_code(sold_out_error: Error) {
    let value = serde_json::to_value(&sold_out_error).expect("serialise error");
    assert_eq!(value["code"], "sold_out");
    assert_eq!(value["message"], "flight AA/101 is sold out");
    assert_eq!(value["details"]["flightNum"], "101");
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let payload = json!({"code": "sold_out", "message": "  "});
    let result = serde_json::from_value::<Error>(payload);
    assert!(result.is_err());
}

#[rstest]
fn deserialisation_restores_details(sold_out_error: Error) {
    let value = serde_json::to_value(&sold_out_error).expect("serialise error");
    let restored: Error = serde_json::from_value(value).expect("deserialise error");
    assert_eq!(restored, sold_out_error);
}
