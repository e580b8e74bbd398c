use serde_json::json;

use crate::error::{ApiError, ApiException, ErrorBody, ErrorCode};

#[test]
fn plain_string_detail_is_used_verbatim() {
    let body: ErrorBody =
        serde_json::from_value(json!({"detail": "Email already registered"})).expect("body");
    assert_eq!(body.message().as_deref(), Some("Email already registered"));
}

#[test]
fn validation_list_detail_is_flattened() {
    let body: ErrorBody = serde_json::from_value(json!({
        "detail": [
            {"loc": ["body", "title"], "msg": "ensure this value has at least 1 characters", "type": "value_error"},
            {"loc": ["body"], "msg": "field required", "type": "value_error.missing"}
        ]
    }))
    .expect("body");
    assert_eq!(
        body.message().as_deref(),
        Some("title: ensure this value has at least 1 characters; field required")
    );
}

#[test]
fn missing_or_blank_detail_yields_none() {
    assert_eq!(ErrorBody::default().message(), None);
    let blank: ErrorBody = serde_json::from_value(json!({"detail": "   "})).expect("body");
    assert_eq!(blank.message(), None);
}

#[test]
fn status_codes_map_to_error_codes() {
    assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
    assert_eq!(ErrorCode::from_status(404), ErrorCode::NotFound);
    assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
    assert_eq!(ErrorCode::from_status(502), ErrorCode::Internal);
}

#[test]
fn api_exception_displays_message_and_converts_both_ways() {
    let exception = ApiException::new(ErrorCode::NotFound, "Decision not found");
    assert_eq!(exception.to_string(), "Decision not found");

    let error: ApiError = exception.into();
    assert_eq!(error, ApiError::new(ErrorCode::NotFound, "Decision not found"));
    assert_eq!(ApiException::from(error).code, ErrorCode::NotFound);
}
