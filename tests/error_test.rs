//! 错误类型测试

use flare_grpc_discovery::error::{ErrorCategory, ErrorCode, FlareError};
use tonic::{Code, Status};

#[test]
fn no_backend_maps_to_unavailable() {
    let err = FlareError::no_backend_available();
    assert!(err.is_retryable());
    assert_eq!(err.code().unwrap().category(), ErrorCategory::System);

    let status: Status = err.into();
    assert_eq!(status.code(), Code::Unavailable);
    assert_eq!(
        status.metadata().get("error-code").unwrap().to_str().unwrap(),
        "6007"
    );
}

#[test]
fn invalid_target_maps_to_invalid_argument() {
    let err = FlareError::invalid_target("consul://host/only", "path must be /group/serviceName");
    assert!(!err.is_retryable());
    assert_eq!(err.details(), Some("path must be /group/serviceName"));

    let status: Status = err.into();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.metadata().get("error-details").is_some());
}

#[test]
fn registry_failures_are_retryable() {
    let err = FlareError::registry("connection refused").with_details("503");
    assert_eq!(err.code(), Some(ErrorCode::RegistryUnavailable));
    assert!(err.is_retryable());
    assert_eq!(err.reason(), "connection refused");
}

#[test]
fn status_round_trip_keeps_category() {
    let err: FlareError = Status::unavailable("draining").into();
    assert_eq!(err.code(), Some(ErrorCode::ServiceUnavailable));
    assert_eq!(err.reason(), "draining");
}

#[test]
fn error_codes_round_trip_through_u32() {
    for code in [
        ErrorCode::ConnectionTimeout,
        ErrorCode::NoBackendAvailable,
        ErrorCode::NoNetworkInterface,
        ErrorCode::InvalidTarget,
    ] {
        assert_eq!(ErrorCode::from_u32(code.as_u32()), Some(code));
    }
    assert_eq!(ErrorCode::from_u32(4242), None);
}

#[test]
fn only_constructed_codes_are_defined() {
    for retired in [1002, 7000, 8000, 9000] {
        assert_eq!(ErrorCode::from_u32(retired), None);
    }
    assert_eq!(ErrorCode::NetworkTimeout.category(), ErrorCategory::Network);
    assert_eq!(ErrorCode::DeserializationError.category(), ErrorCategory::Serialization);
    assert_eq!(ErrorCode::UnknownError.category(), ErrorCategory::General);
}
