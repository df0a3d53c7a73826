//! gRPC 错误处理
//!
//! 提供 gRPC 状态码与 FlareError 之间的转换

use super::{ErrorCode, FlareError};
use tonic::{Code, Status};

impl From<FlareError> for Status {
    fn from(err: FlareError) -> Self {
        match err {
            FlareError::Localized {
                code,
                reason,
                details,
                ..
            } => {
                let mut status = Status::new(map_error_code_to_grpc(code), reason);

                if let Some(details) = details {
                    if let Ok(value) = details.parse() {
                        status.metadata_mut().insert("error-details", value);
                    }
                }

                if let Ok(value) = code.as_u32().to_string().parse() {
                    status.metadata_mut().insert("error-code", value);
                }

                status
            }
            FlareError::System(msg) => Status::internal(msg),
            FlareError::Io(msg) => Status::unavailable(msg),
        }
    }
}

/// 将错误代码映射到 gRPC 状态码
pub fn map_error_code_to_grpc(code: ErrorCode) -> Code {
    match code {
        // 参数相关
        ErrorCode::InvalidParameter | ErrorCode::InvalidTarget => Code::InvalidArgument,

        // 服务不可用（调用方可重试）
        ErrorCode::NoBackendAvailable
        | ErrorCode::ServiceUnavailable
        | ErrorCode::RegistryUnavailable
        | ErrorCode::ConnectionFailed => Code::Unavailable,

        // 超时
        ErrorCode::ConnectionTimeout | ErrorCode::NetworkTimeout => Code::DeadlineExceeded,

        // 内部错误
        ErrorCode::InternalError
        | ErrorCode::ConfigurationError
        | ErrorCode::RegistrationFailed
        | ErrorCode::NoNetworkInterface
        | ErrorCode::DeserializationError => Code::Internal,

        ErrorCode::UnknownError => Code::Unknown,
    }
}
