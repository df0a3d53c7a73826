//! 错误类型转换实现

use super::{ErrorCode, FlareError};
use std::io;

impl From<io::Error> for FlareError {
    fn from(err: io::Error) -> Self {
        FlareError::io(err.to_string())
    }
}

impl From<serde_json::Error> for FlareError {
    fn from(err: serde_json::Error) -> Self {
        FlareError::deserialization_error(format!("JSON 解析错误: {}", err))
    }
}

impl From<toml::de::Error> for FlareError {
    fn from(err: toml::de::Error) -> Self {
        FlareError::configuration(format!("TOML 解析错误: {}", err))
    }
}

impl From<http::uri::InvalidUri> for FlareError {
    fn from(err: http::uri::InvalidUri) -> Self {
        FlareError::localized(ErrorCode::InvalidParameter, format!("invalid uri: {}", err))
    }
}

impl From<reqwest::Error> for FlareError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::NetworkTimeout
        } else if err.is_decode() {
            ErrorCode::DeserializationError
        } else {
            ErrorCode::RegistryUnavailable
        };
        FlareError::localized(code, format!("registry request failed: {}", err))
    }
}

impl From<tonic::transport::Error> for FlareError {
    fn from(err: tonic::transport::Error) -> Self {
        FlareError::connection_failed(format!("transport error: {}", err))
    }
}

impl From<tonic::Status> for FlareError {
    fn from(status: tonic::Status) -> Self {
        let error_code = match status.code() {
            tonic::Code::InvalidArgument => ErrorCode::InvalidParameter,
            tonic::Code::Internal => ErrorCode::InternalError,
            tonic::Code::Unavailable => ErrorCode::ServiceUnavailable,
            tonic::Code::DeadlineExceeded => ErrorCode::NetworkTimeout,
            _ => ErrorCode::UnknownError,
        };

        FlareError::localized(error_code, status.message())
    }
}
